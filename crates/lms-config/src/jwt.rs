use std::env;

/// Token signing settings.
///
/// `validate_exp` controls whether an expired access or refresh token is
/// rejected. It defaults to `true`; `JWT_VALIDATE_EXP=false` turns expiry
/// checking off.
#[derive(Clone, Debug)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expiry: i64,
    pub refresh_token_expiry: i64,
    pub validate_exp: bool,
}

impl JwtConfig {
    pub fn from_env() -> Self {
        let config = Self {
            secret: env::var("JWT_SECRET")
                .unwrap_or_else(|_| "your-secret-key-change-in-production".to_string()),
            access_token_expiry: env::var("JWT_ACCESS_EXPIRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(3600), // 1 hour
            refresh_token_expiry: env::var("JWT_REFRESH_EXPIRY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(604800), // 7 days
            validate_exp: env::var("JWT_VALIDATE_EXP")
                .ok()
                .map(|v| parse_flag(&v))
                .unwrap_or(true),
        };

        if !config.validate_exp {
            tracing::warn!("JWT expiry validation is disabled (JWT_VALIDATE_EXP=false)");
        }

        config
    }
}

pub(crate) fn parse_flag(value: &str) -> bool {
    !matches!(value.trim().to_lowercase().as_str(), "false" | "0" | "no" | "off")
}
