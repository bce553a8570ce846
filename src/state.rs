use std::env;

use aws_config::{BehaviorVersion, Region, SdkConfig};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header};
use lambda_http::Error;

pub struct AppState {
    pub aws_config: SdkConfig,
    pub jwt: (EncodingKey, DecodingKey, Header),
}

fn jwt_keys() -> Result<(EncodingKey, DecodingKey, Header), Error> {
    let secret = env::var("JWT_SECRET").map_err(|e| e.to_string())?;
    Ok((
        EncodingKey::from_base64_secret(&secret)?,
        DecodingKey::from_base64_secret(&secret)?,
        Header::new(Algorithm::HS256),
    ))
}

impl AppState {
    pub async fn new() -> Result<Self, Error> {
        let region = env::var("AWS_REGION").unwrap_or_else(|_| "us-east-1".to_string());
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region))
            .load()
            .await;

        Ok(Self {
            aws_config: config,
            jwt: jwt_keys()?,
        })
    }

    /// Same state pointed at a local DynamoDB endpoint.
    pub async fn test() -> Result<Self, Error> {
        let endpoint =
            env::var("DYNAMODB_ENDPOINT").unwrap_or_else(|_| "http://localhost:8000".to_string());
        let config = aws_config::defaults(BehaviorVersion::latest())
            .endpoint_url(endpoint)
            .region(Region::new("test"))
            .load()
            .await;

        Ok(Self {
            aws_config: config,
            jwt: jwt_keys()?,
        })
    }
}
