//! Trend analysis and descriptive statistics.
//!
//! The analyzer only reads the table. Trends are the mean first difference of
//! every numeric column; the summary depends on the column kind.

mod statistics;

use crate::error::AnalyzeError;
use crate::table::TimeTable;
use crate::utils::{ColumnKind, column_kind, datetime_millis, f64_values, first_mode_index};
use chrono::DateTime;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use tracing::debug;

/// Mean change between consecutive rows of one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnTrend {
    pub column: String,
    /// `None` when the column is not numeric or has no adjacent valid pair.
    pub mean_change: Option<f64>,
}

/// Descriptive statistics for one column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SummaryStats {
    Numeric {
        count: usize,
        mean: Option<f64>,
        std: Option<f64>,
        min: Option<f64>,
        q25: Option<f64>,
        median: Option<f64>,
        q75: Option<f64>,
        max: Option<f64>,
    },
    Categorical {
        count: usize,
        unique: usize,
        top: Option<String>,
        freq: usize,
    },
    Temporal {
        count: usize,
        first: Option<String>,
        last: Option<String>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSummary {
    pub column: String,
    #[serde(flatten)]
    pub stats: SummaryStats,
}

/// Result of [`TrendAnalyzer::analyze`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendReport {
    pub trend: Vec<ColumnTrend>,
    pub summary: Vec<ColumnSummary>,
}

impl TrendReport {
    /// Trend of a column by name.
    pub fn trend_of(&self, column: &str) -> Option<f64> {
        self.trend
            .iter()
            .find(|t| t.column == column)
            .and_then(|t| t.mean_change)
    }

    /// Summary of a column by name.
    pub fn summary_of(&self, column: &str) -> Option<&SummaryStats> {
        self.summary
            .iter()
            .find(|s| s.column == column)
            .map(|s| &s.stats)
    }
}

/// Computes a [`TrendReport`] from a table.
pub struct TrendAnalyzer;

impl TrendAnalyzer {
    pub fn analyze(table: &TimeTable) -> Result<TrendReport, AnalyzeError> {
        let columns = table.value_columns();
        if table.height() == 0 || columns.is_empty() {
            return Err(AnalyzeError::EmptyTable);
        }

        let mut trend = Vec::with_capacity(columns.len());
        let mut summary = Vec::with_capacity(columns.len());
        for name in columns {
            let series = table.frame().column(&name)?.as_materialized_series();
            let kind = column_kind(series.dtype());

            let mean_change = match kind {
                ColumnKind::Numeric => statistics::mean_first_difference(&f64_values(series)?),
                _ => None,
            };
            trend.push(ColumnTrend {
                column: name.clone(),
                mean_change,
            });

            let stats = match kind {
                ColumnKind::Numeric => Some(Self::numeric_summary(series)?),
                ColumnKind::Categorical => Some(Self::categorical_summary(series)?),
                ColumnKind::Temporal => Some(Self::temporal_summary(series)?),
                ColumnKind::Other => None,
            };
            match stats {
                Some(stats) => summary.push(ColumnSummary { column: name, stats }),
                None => debug!("No summary for '{}' of type {}", name, series.dtype()),
            }
        }

        Ok(TrendReport { trend, summary })
    }

    fn numeric_summary(series: &Series) -> PolarsResult<SummaryStats> {
        let mut values: Vec<f64> = f64_values(series)?.into_iter().flatten().collect();
        values.sort_by(f64::total_cmp);

        Ok(SummaryStats::Numeric {
            count: values.len(),
            mean: statistics::mean(&values),
            std: statistics::sample_std(&values),
            min: values.first().copied(),
            q25: statistics::quantile(&values, 0.25),
            median: statistics::quantile(&values, 0.5),
            q75: statistics::quantile(&values, 0.75),
            max: values.last().copied(),
        })
    }

    fn categorical_summary(series: &Series) -> PolarsResult<SummaryStats> {
        let text = series.cast(&DataType::String)?;
        let values = text.str()?;

        let distinct: HashSet<&str> = values.into_iter().flatten().collect();
        let (top, freq) = match first_mode_index(&text)? {
            Some(row) => {
                let top = values.get(row);
                let freq = values.into_iter().filter(|v| *v == top).count();
                (top.map(str::to_string), freq)
            }
            None => (None, 0),
        };

        Ok(SummaryStats::Categorical {
            count: series.len() - series.null_count(),
            unique: distinct.len(),
            top,
            freq,
        })
    }

    fn temporal_summary(series: &Series) -> PolarsResult<SummaryStats> {
        let millis: Vec<i64> = datetime_millis(series)?.into_iter().flatten().collect();
        let render = |ms: Option<&i64>| {
            ms.and_then(|ms| DateTime::from_timestamp_millis(*ms))
                .map(|dt| dt.naive_utc().to_string())
        };

        Ok(SummaryStats::Temporal {
            count: millis.len(),
            first: render(millis.iter().min()),
            last: render(millis.iter().max()),
        })
    }
}

fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{:.4}", v))
}

impl fmt::Display for TrendReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Trend Direction")?;
        writeln!(f, "{}", "-".repeat(40))?;
        for t in &self.trend {
            match t.mean_change {
                Some(v) => writeln!(f, "  {:<20} {:+.4}", t.column, v)?,
                None => writeln!(f, "  {:<20} n/a", t.column)?,
            }
        }

        writeln!(f)?;
        writeln!(f, "Data Statistics")?;
        writeln!(f, "{}", "-".repeat(40))?;
        for s in &self.summary {
            match &s.stats {
                SummaryStats::Numeric {
                    count,
                    mean,
                    std,
                    min,
                    q25,
                    median,
                    q75,
                    max,
                } => {
                    writeln!(f, "  {} (numeric)", s.column)?;
                    writeln!(
                        f,
                        "    count={} mean={} std={}",
                        count,
                        fmt_opt(*mean),
                        fmt_opt(*std)
                    )?;
                    writeln!(
                        f,
                        "    min={} 25%={} 50%={} 75%={} max={}",
                        fmt_opt(*min),
                        fmt_opt(*q25),
                        fmt_opt(*median),
                        fmt_opt(*q75),
                        fmt_opt(*max)
                    )?;
                }
                SummaryStats::Categorical {
                    count,
                    unique,
                    top,
                    freq,
                } => {
                    writeln!(f, "  {} (categorical)", s.column)?;
                    writeln!(
                        f,
                        "    count={} unique={} top={} freq={}",
                        count,
                        unique,
                        top.as_deref().unwrap_or("n/a"),
                        freq
                    )?;
                }
                SummaryStats::Temporal { count, first, last } => {
                    writeln!(f, "  {} (temporal)", s.column)?;
                    writeln!(
                        f,
                        "    count={} first={} last={}",
                        count,
                        first.as_deref().unwrap_or("n/a"),
                        last.as_deref().unwrap_or("n/a")
                    )?;
                }
            }
        }
        Ok(())
    }
}
