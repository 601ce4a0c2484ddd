/// Friendly messages shown to users, keyed by a lowercase fragment of the underlying error.
const ERROR_PATTERNS: &[(&str, &str)] = &[
    ("23505", DUPLICATE_MESSAGE),
    ("duplicate", DUPLICATE_MESSAGE),
    ("23503", RELATED_DATA_MESSAGE),
    ("foreign key", RELATED_DATA_MESSAGE),
    ("23514", INVALID_DATA_MESSAGE),
    ("check constraint", INVALID_DATA_MESSAGE),
    ("42501", PERMISSION_MESSAGE),
    ("policy", PERMISSION_MESSAGE),
    ("permission", PERMISSION_MESSAGE),
    ("network", NETWORK_MESSAGE),
    ("fetch", NETWORK_MESSAGE),
    ("timeout", TIMEOUT_MESSAGE),
    ("not found", NOT_FOUND_MESSAGE),
    ("404", NOT_FOUND_MESSAGE),
    ("unauthorized", SESSION_EXPIRED_MESSAGE),
    ("401", SESSION_EXPIRED_MESSAGE),
];

const DUPLICATE_MESSAGE: &str = "Este registro já existe no sistema.";
const RELATED_DATA_MESSAGE: &str = "Operação não permitida devido a dados relacionados.";
const INVALID_DATA_MESSAGE: &str = "Os dados fornecidos não são válidos.";
const PERMISSION_MESSAGE: &str = "Você não tem permissão para realizar esta operação.";
const NETWORK_MESSAGE: &str = "Erro de conexão. Verifique sua internet e tente novamente.";
const TIMEOUT_MESSAGE: &str = "A operação demorou muito. Tente novamente.";
const NOT_FOUND_MESSAGE: &str = "Recurso não encontrado.";
const SESSION_EXPIRED_MESSAGE: &str = "Sessão expirada. Faça login novamente.";
const DEFAULT_MESSAGE: &str = "Ocorreu um erro. Por favor, tente novamente.";

#[derive(Debug, thiserror::Error)]
pub enum WardError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("record store request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("record store rejected the request ({status}): {message}")]
    Unauthorized { status: u16, message: String },
    #[error("record store returned {status}: {message}")]
    Backend { status: u16, message: String },
    #[error("failed to decode record store response: {0}")]
    Decode(#[from] serde_json::Error),
    #[error("record not found: {table}/{id}")]
    NotFound { table: &'static str, id: String },

    #[error("failed to read snapshot: {0}")]
    SnapshotRead(std::io::Error),
    #[error("record error: {0}")]
    Record(#[from] records::RecordError),
}

pub type WardResult<T> = std::result::Result<T, WardError>;

impl WardError {
    /// Message suitable for a toast: never leaks backend detail.
    pub fn user_message(&self) -> &'static str {
        match self {
            WardError::Transport(e) if e.is_timeout() => TIMEOUT_MESSAGE,
            WardError::Transport(_) => NETWORK_MESSAGE,
            WardError::Unauthorized { status: 401, .. } => SESSION_EXPIRED_MESSAGE,
            WardError::Unauthorized { .. } => PERMISSION_MESSAGE,
            WardError::NotFound { .. } => NOT_FOUND_MESSAGE,
            other => {
                let text = other.to_string().to_lowercase();
                ERROR_PATTERNS
                    .iter()
                    .find(|(pattern, _)| text.contains(pattern))
                    .map(|(_, message)| *message)
                    .unwrap_or(DEFAULT_MESSAGE)
            }
        }
    }

    /// True for failures of the record store itself rather than of local input.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            WardError::Transport(_)
                | WardError::Unauthorized { .. }
                | WardError::Backend { .. }
                | WardError::Decode(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_postgres_codes_to_friendly_messages() {
        let err = WardError::Backend {
            status: 409,
            message: "duplicate key value violates unique constraint (23505)".into(),
        };
        assert_eq!(err.user_message(), DUPLICATE_MESSAGE);

        let err = WardError::Backend {
            status: 400,
            message: "violates foreign key constraint".into(),
        };
        assert_eq!(err.user_message(), RELATED_DATA_MESSAGE);
    }

    #[test]
    fn maps_auth_statuses() {
        let expired = WardError::Unauthorized {
            status: 401,
            message: "JWT expired".into(),
        };
        assert_eq!(expired.user_message(), SESSION_EXPIRED_MESSAGE);

        let forbidden = WardError::Unauthorized {
            status: 403,
            message: "new row violates row-level security".into(),
        };
        assert_eq!(forbidden.user_message(), PERMISSION_MESSAGE);
    }

    #[test]
    fn falls_back_to_default_message() {
        let err = WardError::InvalidInput("bad offset".into());
        assert_eq!(err.user_message(), DEFAULT_MESSAGE);
        assert!(!err.is_upstream());
    }

    #[test]
    fn not_found_is_friendly() {
        let err = WardError::NotFound {
            table: "beds",
            id: "x".into(),
        };
        assert_eq!(err.user_message(), NOT_FOUND_MESSAGE);
    }
}
