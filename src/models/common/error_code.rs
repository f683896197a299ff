/// 业务错误码
///
/// 前两位对应 HTTP 状态，后两位为业务细分。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(i32)]
pub enum ErrorCode {
    Success = 0,

    BadRequest = 40000,
    InvalidInput = 40001,
    InvalidStateTransition = 40002,

    NotFound = 40400,
    SubmissionNotFound = 40401,
    GradeNotFound = 40402,
    SyncJobNotFound = 40403,
    IntegrationNotFound = 40404,

    Conflict = 40900,
    AlreadyCancelled = 40901,

    InternalServerError = 50000,
}
