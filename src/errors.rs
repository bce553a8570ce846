use aws_sdk_dynamodb::{
    error::SdkError as DynamoSdkError,
    operation::{
        batch_get_item::BatchGetItemError, delete_item::DeleteItemError, get_item::GetItemError,
        put_item::PutItemError, query::QueryError, scan::ScanError,
        transact_write_items::TransactWriteItemsError, update_item::UpdateItemError,
    },
};
use axum::{
    http::{self, StatusCode},
    response::{IntoResponse, Response},
};
use lambda_http::tracing;
use utoipa::{PartialSchema, ToSchema};

use crate::models::ErrorResponse;

#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    #[error("DynamoDB Error: GetItem: {0}")]
    DynamoDBGetError(#[from] DynamoSdkError<GetItemError>),
    #[error("DynamoDB Error: PutItem: {0}")]
    DynamoDBPutError(#[from] DynamoSdkError<PutItemError>),
    #[error("DynamoDB Error: Query: {0}")]
    DynamoDBQueryError(#[from] DynamoSdkError<QueryError>),
    #[error("DynamoDB Error: Scan: {0}")]
    DynamoDBScanError(#[from] DynamoSdkError<ScanError>),
    #[error("DynamoDB Error: BatchGetItem: {0}")]
    DynamoDBBatchGetError(#[from] DynamoSdkError<BatchGetItemError>),
    #[error("DynamoDB Error: DeleteItem: {0}")]
    DynamoDBDeleteError(#[from] DynamoSdkError<DeleteItemError>),
    #[error("DynamoDB Error: UpdateItem: {0}")]
    DynamoDBUpdateError(#[from] DynamoSdkError<UpdateItemError>),
    #[error("DynamoDB Error: TransactWriteItems: {0}")]
    DynamoDBTransactWriteItemsError(#[from] DynamoSdkError<TransactWriteItemsError>),
    #[error("Failed to build transaction: {0}")]
    TransactionBuildError(#[from] aws_sdk_dynamodb::error::BuildError),
    #[error("JWT operation failed: {0}")]
    JWTError(#[from] jsonwebtoken::errors::Error),
    #[error("PasswordHash error: {0}")]
    PasswordHashError(#[from] scrypt::password_hash::Error),
    #[error("SerdeDynamo failed to process DynamoDB data: {0}")]
    SerdeDynamoError(#[from] serde_dynamo::Error),
    #[error("HTTP library error: {0}")]
    HttpError(#[from] http::Error),
    #[error("{0}")]
    Unauthenticated(String),
    #[error("{0}")]
    Forbidden(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("Bid too low: the minimum acceptable bid is {minimum}.")]
    BidTooLow { minimum: u64 },
    #[error("{0}")]
    Conflict(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl HandlerError {
    pub fn auction_not_found() -> Self {
        Self::NotFound("Auction not found".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::InvalidState(_) | Self::BidTooLow { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<HandlerError> for ErrorResponse {
    fn from(value: HandlerError) -> Self {
        let status = value.status();
        let inner_status = match &value {
            HandlerError::DynamoDBGetError(e) => e.raw_response().map(|r| r.status().as_u16()),
            HandlerError::DynamoDBPutError(e) => e.raw_response().map(|r| r.status().as_u16()),
            HandlerError::DynamoDBQueryError(e) => e.raw_response().map(|r| r.status().as_u16()),
            HandlerError::DynamoDBScanError(e) => e.raw_response().map(|r| r.status().as_u16()),
            HandlerError::DynamoDBBatchGetError(e) => {
                e.raw_response().map(|r| r.status().as_u16())
            }
            HandlerError::DynamoDBDeleteError(e) => e.raw_response().map(|r| r.status().as_u16()),
            HandlerError::DynamoDBUpdateError(e) => e.raw_response().map(|r| r.status().as_u16()),
            HandlerError::DynamoDBTransactWriteItemsError(e) => {
                e.raw_response().map(|r| r.status().as_u16())
            }
            _ => None,
        };
        // Validation errors carry user-displayable messages; everything else
        // is logged and reported as a generic internal failure.
        let message = if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("internal error: {}", value);
            "Internal server error".to_string()
        } else {
            value.to_string()
        };

        Self {
            status: status.as_u16(),
            inner_status,
            message,
        }
    }
}

impl IntoResponse for HandlerError {
    fn into_response(self) -> Response {
        ErrorResponse::from(self).into_response()
    }
}

impl PartialSchema for HandlerError {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        ErrorResponse::schema()
    }
}

impl ToSchema for HandlerError {
    fn schemas(
        schemas: &mut Vec<(
            String,
            utoipa::openapi::RefOr<utoipa::openapi::schema::Schema>,
        )>,
    ) {
        <ErrorResponse as ToSchema>::schemas(schemas);
    }
}
