//! 外部协作服务客户端
//!
//! OCR 引擎、AI 评估模型与 LMS 连接器都通过窄接口访问，
//! 流水线不关心其内部实现。

pub mod lms;
pub mod model;
pub mod ocr;
