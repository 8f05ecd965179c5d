use marlin_application::config::{Config, DataSourceKind};
use marlin_domain::repositories::artifacts::{ArtifactReader, ArtifactWriter};
use marlin_domain::repositories::market_data::MarketDataRepository;
use marlin_domain::repositories::result_store::ResultStore;
use marlin_infrastructure::artifacts::{FilesystemArtifactReader, FilesystemArtifactWriter};
use marlin_infrastructure::market_data::http::HttpMarketDataRepository;
use marlin_infrastructure::market_data::ohlcv::CsvMarketDataRepository;
use marlin_infrastructure::persistence::postgres_results::PostgresResultStore;
use std::env;
use std::path::PathBuf;

pub struct EngineDeps {
    pub market_data: Box<dyn MarketDataRepository>,
    pub artifacts: Box<dyn ArtifactWriter>,
    pub store: Option<Box<dyn ResultStore>>,
}

pub struct ValidateDeps {
    pub market_data: Box<dyn MarketDataRepository>,
}

pub struct ReportingDeps {
    pub reader: Box<dyn ArtifactReader>,
    pub writer: Box<dyn ArtifactWriter>,
}

pub fn build_engine_deps(config: &Config) -> Result<EngineDeps, String> {
    Ok(EngineDeps {
        market_data: build_market_data_repo(config)?,
        artifacts: Box::new(FilesystemArtifactWriter::new()),
        store: build_result_store(config)?,
    })
}

pub fn build_validate_deps(config: &Config) -> Result<ValidateDeps, String> {
    Ok(ValidateDeps {
        market_data: build_market_data_repo(config)?,
    })
}

pub fn build_reporting_deps() -> ReportingDeps {
    ReportingDeps {
        reader: Box::new(FilesystemArtifactReader::new()),
        writer: Box::new(FilesystemArtifactWriter::new()),
    }
}

fn build_market_data_repo(config: &Config) -> Result<Box<dyn MarketDataRepository>, String> {
    match config.data.source {
        DataSourceKind::Csv => {
            let path = config
                .data
                .path
                .as_deref()
                .ok_or_else(|| "data.source=csv requires data.path".to_string())?;
            Ok(Box::new(CsvMarketDataRepository::new(PathBuf::from(path))))
        }
        DataSourceKind::Http => {
            let endpoint = config
                .data
                .endpoint
                .as_deref()
                .ok_or_else(|| "data.source=http requires data.endpoint".to_string())?;
            Ok(Box::new(HttpMarketDataRepository::new(endpoint.to_string())))
        }
    }
}

fn build_result_store(config: &Config) -> Result<Option<Box<dyn ResultStore>>, String> {
    let Some(store) = &config.store else {
        return Ok(None);
    };
    let db_url = match store.url.as_deref() {
        Some(url) if !url.trim().is_empty() => url.to_string(),
        _ => env::var("MARLIN_DB_URL")
            .map_err(|_| "missing store.url in config and env MARLIN_DB_URL is not set".to_string())?,
    };
    let pool_max_size = store.pool_max_size.unwrap_or(4);
    let postgres = PostgresResultStore::new(db_url, store.table.clone(), pool_max_size)?;
    postgres.ensure_schema()?;
    Ok(Some(Box::new(postgres)))
}
