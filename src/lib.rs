//! Learnboard - 在线学习平台的提交评分后端服务
//!
//! 基于 Actix Web 构建的自动评分流水线：内容提取（OCR）、AI 评估、
//! 评分对账与 LMS 成绩同步。
//!
//! # 架构
//! - `clients`: 外部服务客户端（OCR / 评估模型 / LMS 连接器）
//! - `config`: 配置管理
//! - `entity`: SeaORM 数据库实体
//! - `errors`: 统一错误处理
//! - `models`: 数据模型定义
//! - `pipeline`: 评分流水线状态机
//! - `routes`: API 路由层
//! - `runtime`: 运行时生命周期管理
//! - `services`: 业务逻辑层
//! - `storage`: 数据存储层（SeaORM）
//! - `utils`: 工具函数

pub mod clients;
pub mod config;
pub mod entity;
pub mod errors;
pub mod models;
pub mod pipeline;
pub mod routes;
pub mod runtime;
pub mod services;
pub mod storage;
pub mod utils;
