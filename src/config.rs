use std::env::var;

use dotenvy::dotenv;

use crate::domain::value_objects::SiteContext;

pub struct Config {
    pub database_url: String,
    pub site: SiteContext,
    pub mail_gateway_url: Option<String>,
}

impl Config {
    pub fn try_parse() -> Result<Config, &'static str> {
        let _ = dotenv();

        Ok(Config {
            database_url: var("DATABASE_URL")
                .map_err(|_| "An error occured while getting DATABASE_URL env param")?,
            site: SiteContext {
                scheme: var("SITE_SCHEME").unwrap_or_else(|_| "https".to_string()),
                domain: var("SITE_DOMAIN")
                    .map_err(|_| "An error occured while getting SITE_DOMAIN env param")?,
                name: var("SITE_NAME")
                    .map_err(|_| "An error occured while getting SITE_NAME env param")?,
            },
            mail_gateway_url: var("MAIL_GATEWAY_URL").ok(),
        })
    }
}
