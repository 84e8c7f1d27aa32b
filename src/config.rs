// Environment-style configuration
// Missing statistics credentials are fine (fallback-only mode); missing SMTP
// settings only matter once the booking relay is built

use std::{env, fmt::Display, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

use crate::mailer::SmtpConfig;
use crate::stats::{AggregateStats, AggregatorConfig, NumberFormat};
use crate::youtube::{YouTubeConfig, DEFAULT_API_BASE};

pub const DEFAULT_CHANNEL_IDS: [&str; 6] = [
    "UC_9xRXWjRrz_Jy7SWhUnBBw",
    "UCe68ABxGwMZO3J8y_gerZ6A",
    "UCEMsE6ZgO2sYnFBGxQK9vPA",
    "UCP6h0y-N-FUo8ATdUNpyxOA",
    "UCX7JsAQDAQzWpOeW2n7ZbxQ",
    "UCSVT1XTcae5Flp94OODu4mw",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("missing configuration: {0}")]
    Missing(String),

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

// One consumer of aggregated channel statistics
#[derive(Debug, Clone)]
pub struct SurfaceConfig {
    pub channel_ids: Vec<String>,
    pub aggregator: AggregatorConfig,
    pub number_format: NumberFormat,
}

// Figures the highlights strip shows next to the live subscriber count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HighlightFigures {
    pub followers: u64,
    pub events: u64,
    pub years: u64,
}

impl Default for HighlightFigures {
    fn default() -> Self {
        Self {
            followers: 2_000_000,
            events: 100,
            years: 13,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub youtube: YouTubeConfig,
    pub hero: SurfaceConfig,
    pub highlights: SurfaceConfig,
    pub highlight_figures: HighlightFigures,
    smtp: Result<SmtpConfig, ConfigError>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_key = var("YOUTUBE_API_KEY").or_else(|| var("NEXT_PUBLIC_YOUTUBE_API_KEY"));
        if api_key.is_none() {
            warn!("YouTube API key not found, statistics will use fallback values");
        }

        let channel_ids = match var("STATS_CHANNEL_IDS") {
            Some(raw) => parse_list(&raw),
            None => DEFAULT_CHANNEL_IDS.iter().map(|s| s.to_string()).collect(),
        };
        if channel_ids.is_empty() {
            return Err(ConfigError::Invalid("STATS_CHANNEL_IDS is empty".to_string()));
        }

        let youtube = YouTubeConfig {
            api_key,
            base_url: var("YOUTUBE_API_BASE").unwrap_or_else(|| DEFAULT_API_BASE.to_string()),
            request_timeout_ms: parse_or("YOUTUBE_REQUEST_TIMEOUT_MS", var("YOUTUBE_REQUEST_TIMEOUT_MS"), 8000)?,
        };

        let hero = SurfaceConfig {
            channel_ids: channel_ids.clone(),
            aggregator: AggregatorConfig {
                timeout_ms: parse_or("HERO_STATS_TIMEOUT_MS", var("HERO_STATS_TIMEOUT_MS"), 8000)?,
                ..AggregatorConfig::default()
            },
            number_format: NumberFormat::default(),
        };

        let highlights = SurfaceConfig {
            channel_ids,
            aggregator: AggregatorConfig {
                timeout_ms: parse_or("HIGHLIGHT_STATS_TIMEOUT_MS", var("HIGHLIGHT_STATS_TIMEOUT_MS"), 5000)?,
                categories: 0,
                fallback: AggregateStats {
                    subscribers: 500_000,
                    ..AggregateStats::default()
                },
                require_subscribers: true,
            },
            number_format: NumberFormat::compact(),
        };

        let smtp = smtp_from(&var);
        if let Err(e) = &smtp {
            warn!(error = %e, "SMTP not configured, booking requests will fail");
        }

        let bind_addr = var("BIND_ADDR").unwrap_or_else(|| {
            info!("BIND_ADDR not set, using default: 0.0.0.0:3000");
            "0.0.0.0:3000".to_string()
        });

        Ok(Self {
            bind_addr,
            youtube,
            hero,
            highlights,
            highlight_figures: HighlightFigures::default(),
            smtp,
        })
    }

    pub fn smtp(&self) -> Result<&SmtpConfig, ConfigError> {
        self.smtp.as_ref().map_err(|e| e.clone())
    }
}

fn smtp_from<F>(var: &F) -> Result<SmtpConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let require = |key: &str| var(key).ok_or_else(|| ConfigError::Missing(key.to_string()));

    Ok(SmtpConfig {
        host: require("SMTP_HOST")?,
        port: parse_or("SMTP_PORT", var("SMTP_PORT"), 587)?,
        username: require("SMTP_USER")?,
        password: require("SMTP_PASS")?,
        operator_address: require("ADMIN_EMAIL")?,
        timeout_secs: parse_or("SMTP_TIMEOUT_SECS", var("SMTP_TIMEOUT_SECS"), 10)?,
    })
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: Display,
{
    match raw {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|e| ConfigError::Invalid(format!("{key}={value:?}: {e}"))),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
