use dotenv::dotenv;
use serde::Deserialize;
use std::fmt;

#[derive(Clone, Deserialize)]
pub struct AppConfig {
    /// Absent means the process runs on the in-memory store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub jwt_secret: String,
    /// Shared key the identity provider signs login assertions with.
    pub idp_secret: String,
    pub jwt_ttl_hours: i64,
    pub database_pool_size: u32,
    pub default_page_size: i64,
    pub max_page_size: i64,
    /// Accounts treated as administrators regardless of their `is_admin` flag.
    #[serde(default)]
    pub admin_emails: Vec<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv().ok(); // Load .env file if present
        config::Config::builder()
            .set_default("host", "127.0.0.1")?
            .set_default("port", 5000)?
            .set_default("jwt_ttl_hours", 24)?
            .set_default("database_pool_size", 10)?
            .set_default("default_page_size", 12)?
            .set_default("max_page_size", 100)?
            .add_source(
                config::Environment::default()
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("admin_emails"),
            )
            .build()?
            .try_deserialize()
    }

    pub fn is_admin_email(&self, email: &str) -> bool {
        self.admin_emails
            .iter()
            .any(|admin| admin.trim().eq_ignore_ascii_case(email))
    }
}

// Hand-written so the signing secrets and database credentials never reach the logs.
impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("database", &self.database_url.as_ref().map(|_| "<configured>"))
            .field("host", &self.host)
            .field("port", &self.port)
            .field("jwt_ttl_hours", &self.jwt_ttl_hours)
            .field("database_pool_size", &self.database_pool_size)
            .field("default_page_size", &self.default_page_size)
            .field("max_page_size", &self.max_page_size)
            .field("admin_emails", &self.admin_emails)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_admins(admins: &[&str]) -> AppConfig {
        AppConfig {
            database_url: None,
            host: "127.0.0.1".to_string(),
            port: 5000,
            jwt_secret: "secret".to_string(),
            idp_secret: "idp-secret".to_string(),
            jwt_ttl_hours: 24,
            database_pool_size: 1,
            default_page_size: 12,
            max_page_size: 100,
            admin_emails: admins.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn admin_allow_list_ignores_case_and_padding() {
        let config = config_with_admins(&[" Ops@Kamer-Rent.cm "]);
        assert!(config.is_admin_email("ops@kamer-rent.cm"));
        assert!(!config.is_admin_email("renter@kamer-rent.cm"));
    }

    #[test]
    fn debug_output_hides_secrets() {
        let mut config = config_with_admins(&[]);
        config.database_url = Some("postgres://user:hunter2@db/rent".to_string());
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("hunter2"));
        assert!(!rendered.contains("secret"));
    }
}
