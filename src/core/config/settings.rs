use super::parsing::{
    env_optional, env_or_default, parse_bool, parse_cors_origins, parse_environment, parse_u32,
    parse_usize,
};
use super::types::{
    ApiSettings, ConfigError, CorsSettings, DatabaseSettings, ImportSettings, RuntimeSettings,
    ServerHost, ServerPort, ServerSettings, Settings, TelemetrySettings,
};

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("EDUMATE_HOST", "0.0.0.0");
        let port = env_or_default("EDUMATE_PORT", "8000");

        let environment =
            parse_environment(env_optional("EDUMATE_ENV").or_else(|| env_optional("ENVIRONMENT")));
        let strict_config =
            env_optional("EDUMATE_STRICT_CONFIG").map(|value| parse_bool(&value)).unwrap_or(false)
                || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "Edumate API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_v1_str = env_or_default("API_V1_STR", "/api/v1");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let database_url = env_optional("DATABASE_URL");
        let max_connections = parse_u32(
            "SQLITE_MAX_CONNECTIONS",
            env_or_default("SQLITE_MAX_CONNECTIONS", "5"),
        )?;

        let max_payload_bytes =
            parse_usize("IMPORT_MAX_BYTES", env_or_default("IMPORT_MAX_BYTES", "5242880"))?;
        let quiz_placeholder_options = parse_usize(
            "QUIZ_PLACEHOLDER_OPTIONS",
            env_or_default("QUIZ_PLACEHOLDER_OPTIONS", "3"),
        )?;
        let paper_placeholder_options = parse_usize(
            "PAPER_PLACEHOLDER_OPTIONS",
            env_or_default("PAPER_PLACEHOLDER_OPTIONS", "2"),
        )?;
        let default_user_name = env_or_default("DEFAULT_USER_NAME", "Default User");
        let default_user_email = env_or_default("DEFAULT_USER_EMAIL", "default@edumate.local");

        let log_level = env_or_default("EDUMATE_LOG_LEVEL", "info");
        let json = env_optional("EDUMATE_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_v1_str },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings { database_url, max_connections },
            import: ImportSettings {
                max_payload_bytes,
                quiz_placeholder_options,
                paper_placeholder_options,
                default_user_name,
                default_user_email,
            },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn import(&self) -> &ImportSettings {
        &self.import
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.database.max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                field: "SQLITE_MAX_CONNECTIONS",
                value: "0".to_string(),
            });
        }

        if self.import.max_payload_bytes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "IMPORT_MAX_BYTES",
                value: "0".to_string(),
            });
        }

        if self.import.quiz_placeholder_options == 0 {
            return Err(ConfigError::InvalidValue {
                field: "QUIZ_PLACEHOLDER_OPTIONS",
                value: "0".to_string(),
            });
        }

        if self.import.paper_placeholder_options == 0 {
            return Err(ConfigError::InvalidValue {
                field: "PAPER_PLACEHOLDER_OPTIONS",
                value: "0".to_string(),
            });
        }

        if !self.import.default_user_email.contains('@') {
            return Err(ConfigError::InvalidValue {
                field: "DEFAULT_USER_EMAIL",
                value: self.import.default_user_email.clone(),
            });
        }

        if !(self.runtime.strict_config || self.runtime.environment.is_production()) {
            return Ok(());
        }

        if self.database.database_url.is_none() {
            return Err(ConfigError::MissingSetting("DATABASE_URL"));
        }

        Ok(())
    }
}

#[cfg(test)]
impl Settings {
    /// Settings for tests that never touch the process environment.
    pub(crate) fn for_tests(database_url: &str) -> Self {
        use super::types::Environment;

        Self {
            server: ServerSettings {
                host: ServerHost("127.0.0.1".to_string()),
                port: ServerPort(8000),
            },
            runtime: RuntimeSettings { environment: Environment::Test, strict_config: false },
            api: ApiSettings {
                project_name: "Edumate API".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                api_v1_str: "/api/v1".to_string(),
            },
            cors: CorsSettings { origins: Vec::new() },
            database: DatabaseSettings {
                database_url: Some(database_url.to_string()),
                max_connections: 1,
            },
            import: ImportSettings {
                max_payload_bytes: 1024 * 1024,
                quiz_placeholder_options: 3,
                paper_placeholder_options: 2,
                default_user_name: "Default User".to_string(),
                default_user_email: "default@edumate.local".to_string(),
            },
            telemetry: TelemetrySettings {
                log_level: "info".to_string(),
                json: false,
                prometheus_enabled: false,
            },
        }
    }

    pub(crate) fn with_prometheus(mut self, enabled: bool) -> Self {
        self.telemetry.prometheus_enabled = enabled;
        self
    }

    pub(crate) fn with_import_limit(mut self, max_payload_bytes: usize) -> Self {
        self.import.max_payload_bytes = max_payload_bytes;
        self
    }
}
