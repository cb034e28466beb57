//! One scan: collect, analyze, report.

use anyhow::{bail, Result};
use std::io::Write;
use tracing::{error, info};

use crate::arbitrage::OpportunityEngine;
use crate::config::{AppConfig, ArbitrageConfig};
use crate::exchanges::{ExchangeStatus, SnapshotCollector};
use crate::models::AnalysisReport;
use crate::report::console::{render_final_stats, render_opportunity_table};
use crate::report::telegram::{format_error, CROSS_TITLE, INTRA_TITLE, SUMMARY_TITLE};
use crate::telegram::TelegramNotifier;

/// Where console tables go during `run_once`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleOutput {
    Colored,
    Plain,
    Silent,
}

pub struct Scanner {
    collector: SnapshotCollector,
    engine: OpportunityEngine,
    notifier: TelegramNotifier,
    limits: ArbitrageConfig,
}

impl Scanner {
    pub fn new(
        collector: SnapshotCollector,
        notifier: TelegramNotifier,
        limits: ArbitrageConfig,
    ) -> Self {
        Self {
            collector,
            engine: limits.engine(),
            notifier,
            limits,
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            SnapshotCollector::from_config(&config.exchanges)?,
            TelegramNotifier::from_config(&config.telegram)?,
            config.arbitrage.clone(),
        ))
    }

    pub fn limits(&self) -> &ArbitrageConfig {
        &self.limits
    }

    pub fn exchange_names(&self) -> Vec<&str> {
        self.collector.source_names()
    }

    /// Poll all sources and run the engine on the frozen snapshots.
    pub async fn analyze(&self) -> Result<AnalysisReport> {
        if self.collector.is_empty() {
            bail!("No exchanges enabled");
        }
        let snapshots = self.collector.collect().await;
        Ok(self.engine.analyze(&snapshots))
    }

    pub async fn status(&self) -> Vec<ExchangeStatus> {
        self.collector.collect_status().await
    }

    /// Full one-shot flow. Errors are logged and pushed to Telegram before returning.
    pub async fn run_once(&self, output: ConsoleOutput) -> Result<AnalysisReport> {
        self.notify("🔄 <b>Spread analysis started</b>", true).await;

        match self.analyze().await {
            Ok(report) => {
                self.emit(&report, output).await;
                Ok(report)
            }
            Err(e) => {
                error!(error = %format!("{:#}", e), "❌ Scan failed");
                self.notify(&format_error("Analysis failed", &e), false)
                    .await;
                Err(e)
            }
        }
    }

    async fn emit(&self, report: &AnalysisReport, output: ConsoleOutput) {
        let top = self.limits.report_top_n;

        if output != ConsoleOutput::Silent {
            let colored = output == ConsoleOutput::Colored;
            let mut text = String::new();
            text.push_str(&render_opportunity_table(&report.intra, INTRA_TITLE, top, colored));
            text.push_str(&render_opportunity_table(&report.cross, CROSS_TITLE, top, colored));
            text.push_str(&render_opportunity_table(&report.summary, SUMMARY_TITLE, top, colored));
            text.push_str(&render_final_stats(report, colored));
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = stdout.write_all(text.as_bytes()) {
                error!(error = %e, "Failed to write console report");
            }
        }

        for (list, title) in [
            (&report.intra, INTRA_TITLE),
            (&report.cross, CROSS_TITLE),
            (&report.summary, SUMMARY_TITLE),
        ] {
            if list.is_empty() {
                continue;
            }
            if let Err(e) = self.notifier.send_opportunities(list, title, top).await {
                error!(error = %format!("{:#}", e), title, "Telegram report failed");
            }
        }

        info!(
            intra = report.intra.len(),
            cross = report.cross.len(),
            total = report.summary.len(),
            best = report.best_profit().unwrap_or(0.0),
            "✅ Scan complete"
        );
    }

    async fn notify(&self, text: &str, silent: bool) {
        if let Err(e) = self.notifier.send_message(text, silent).await {
            error!(error = %format!("{:#}", e), "Telegram notification failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::testing::StaticSource;
    use std::sync::Arc;

    fn scanner(sources: Vec<StaticSource>) -> Scanner {
        Scanner::new(
            SnapshotCollector::new(
                sources
                    .into_iter()
                    .map(|s| Arc::new(s) as Arc<dyn crate::exchanges::RateSource>)
                    .collect(),
            ),
            TelegramNotifier::disabled(),
            ArbitrageConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_run_once_produces_report() {
        let scanner = scanner(vec![
            StaticSource::new("Bybit", &[("BTC", 2.0)], &[("BTC", 3.5)]),
            StaticSource::new("OKX", &[("BTC", 0.5)], &[("BTC", 2.5)]),
        ]);

        let report = scanner.run_once(ConsoleOutput::Silent).await.unwrap();
        assert_eq!(report.intra.len(), 2);
        assert_eq!(report.cross.len(), 1);
        assert_eq!(report.best_profit(), Some(3.0));
    }

    #[tokio::test]
    async fn test_no_sources_is_error() {
        let scanner = scanner(vec![]);
        assert!(scanner.run_once(ConsoleOutput::Silent).await.is_err());
    }

    #[tokio::test]
    async fn test_status_passthrough() {
        let scanner = scanner(vec![StaticSource::new("Bybit", &[("BTC", 2.0)], &[])]);
        let status = scanner.status().await;
        assert_eq!(status.len(), 1);
        assert_eq!(status[0].loan_count, 1);
    }
}
