// crates/moorprof-core/src/outputs.rs

use std::fs;
use std::io::Cursor;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use polars::io::parquet::write::{ParquetCompression, ParquetWriter, StatisticsOptions};
use polars::prelude::DataFrame;
use serde::Serialize;
use uuid::Uuid;

use crate::ingest::DeploymentStreams;
use crate::types::{InstrumentKind, ProfileRecord};

/// Per-profile provenance carried alongside the data products: the paired
/// step/outcome logs let a user reconstruct which profiles and fields were
/// degraded and why without rerunning.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileProvenance {
    pub profile_number: u32,
    pub instrument: InstrumentKind,
    pub direction: String,
    pub backtrack: bool,
    pub code_history: Vec<String>,
    pub data_status: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    pub run_id: Uuid,
    pub deployment_id: String,
    pub profiler_type: String,
    pub generated_at: DateTime<Utc>,
    pub profiles: Vec<ProfileProvenance>,
}

impl RunSummary {
    pub fn from_streams(
        deployment_id: &str,
        profiler_type: &str,
        streams: &DeploymentStreams,
    ) -> Self {
        let mut profiles = Vec::new();
        for (kind, records) in [
            (InstrumentKind::Ctd, &streams.ctd),
            (InstrumentKind::Engineering, &streams.engineering),
            (InstrumentKind::CurrentMeter, &streams.current_meter),
        ] {
            for record in records {
                profiles.push(provenance(kind, record));
            }
        }
        Self {
            run_id: Uuid::new_v4(),
            deployment_id: deployment_id.to_string(),
            profiler_type: profiler_type.to_string(),
            generated_at: Utc::now(),
            profiles,
        }
    }
}

fn provenance(kind: InstrumentKind, record: &ProfileRecord) -> ProfileProvenance {
    ProfileProvenance {
        profile_number: record.profile_number,
        instrument: kind,
        direction: record.direction.as_str().to_string(),
        backtrack: record.backtrack,
        code_history: record
            .code_history
            .iter()
            .map(|code| code.as_str().to_string())
            .collect(),
        data_status: record.data_status.clone(),
    }
}

/// The three output levels for one instrument stream: raw/imported,
/// synchronized-transformed-unbinned, and pressure-binned.
#[derive(Debug)]
pub struct InstrumentProducts {
    pub kind: InstrumentKind,
    pub raw: DataFrame,
    pub unbinned: DataFrame,
    pub binned: DataFrame,
}

/// Writes `l0_/l1_/l2_<instrument>.parquet` and `run.json` into `dir`.
pub fn write_deployment_products(
    dir: &Path,
    products: &[InstrumentProducts],
    summary: &RunSummary,
) -> Result<()> {
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create output directory {}", dir.display()))?;

    for product in products {
        for (level, frame) in [
            ("l0", &product.raw),
            ("l1", &product.unbinned),
            ("l2", &product.binned),
        ] {
            let path = dir.join(format!("{level}_{}.parquet", product.kind.as_str()));
            fs::write(&path, create_parquet_bytes(frame)?)
                .with_context(|| format!("failed to write {}", path.display()))?;
        }
    }

    let summary_path = dir.join("run.json");
    let summary_bytes =
        serde_json::to_vec_pretty(summary).context("failed to serialize run summary")?;
    fs::write(&summary_path, summary_bytes)
        .with_context(|| format!("failed to write {}", summary_path.display()))?;
    Ok(())
}

fn create_parquet_bytes(df: &DataFrame) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    {
        let mut cursor = Cursor::new(&mut buffer);
        let mut clone = df.clone();
        ParquetWriter::new(&mut cursor)
            .with_compression(ParquetCompression::Zstd(None))
            .with_statistics(StatisticsOptions::default())
            .finish(&mut clone)
            .context("failed to write parquet to buffer")?;
    }
    Ok(buffer)
}
