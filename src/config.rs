use std::env;

// ============================================================================
// Settings - Environment Configuration
// ============================================================================

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub api_addr: String,
    pub metrics_port: u16,
    pub max_connections: u32,
}

impl Settings {
    /// Read configuration from the environment. Only DATABASE_URL is
    /// required; everything else has a serviceable default.
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| anyhow::anyhow!("DATABASE_URL no está definida"))?;

        let api_addr = env::var("API_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());

        let metrics_port = match env::var("METRICS_PORT") {
            Ok(valor) => valor
                .parse()
                .map_err(|e| anyhow::anyhow!("METRICS_PORT inválido {valor:?}: {e}"))?,
            Err(_) => 9090,
        };

        let max_connections = match env::var("DB_MAX_CONNECTIONS") {
            Ok(valor) => valor
                .parse()
                .map_err(|e| anyhow::anyhow!("DB_MAX_CONNECTIONS inválido {valor:?}: {e}"))?,
            Err(_) => 10,
        };

        Ok(Self {
            database_url,
            api_addr,
            metrics_port,
            max_connections,
        })
    }
}
