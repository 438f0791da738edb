use actix_web::{
    error::ResponseError,
    HttpResponse,
    http::StatusCode
};
use derive_more::Display;
use log::error;
use serde_json::json;

use crate::repo::StoreError;

#[derive(Debug, Display, PartialEq, Eq)]
pub enum TicketError {
    #[display(fmt = "{}", _0)]
    Validation(String),
    #[display(fmt = "ticket not found")]
    TicketNotFound,
    #[display(fmt = "comment not found")]
    CommentNotFound,
    #[display(fmt = "ticket was modified by someone else, reload and try again")]
    Conflict,
    #[display(fmt = "ticket store unavailable")]
    StoreFailure
}

impl From<StoreError> for TicketError {
    fn from(err: StoreError) -> TicketError {
        match err {
            StoreError::NotFound => TicketError::TicketNotFound,
            StoreError::CommentNotFound => TicketError::CommentNotFound,
            StoreError::Conflict => TicketError::Conflict,
            other => {
                error!("ticket store error: {}", other);
                TicketError::StoreFailure
            }
        }
    }
}

impl ResponseError for TicketError {
    fn status_code(&self) -> StatusCode {
        match self {
            TicketError::Validation(_) => StatusCode::BAD_REQUEST,
            TicketError::TicketNotFound => StatusCode::NOT_FOUND,
            TicketError::CommentNotFound => StatusCode::NOT_FOUND,
            TicketError::Conflict => StatusCode::CONFLICT,
            TicketError::StoreFailure => StatusCode::FAILED_DEPENDENCY
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code())
            .json(json!({ "success": false, "error": self.to_string() }))
    }
}
