//! CLI definition and dispatch.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use forensics_core::{
    Config, DistributionEdge, InverseAllocation, Lot, MarketBoard, Metric, Side, TapeAnalysis,
    Verdict,
};
use forensics_distribution::{edge_bands, layout, DistributionGraph, EdgeBand, GraphLayout};
use forensics_ingestion::normalizer::{parse_broker_code, parse_market_board, parse_side};
use forensics_ingestion::{
    buyers_from_json, BrokerDistributionRequest, TapeCollector, TapePage, TradeTapeRequest,
};
use forensics_tape::{TapeAnalyzer, VerdictSynthesizer};
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(name = "forensics", about = "Intraday order-flow forensics")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Analyze a day's trade tape and print the analysis with a verdict
    Tape {
        /// Tape page files (JSON), in cursor order
        #[arg(short, long, required = true, num_args = 1..)]
        input: Vec<PathBuf>,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        date: NaiveDate,
        /// Only keep trades on this side (buy/sell)
        #[arg(long, value_parser = side_arg)]
        side: Option<Side>,
        /// Only keep trades on this board (RG/NG/TN)
        #[arg(long, value_parser = board_arg)]
        board: Option<MarketBoard>,
        /// Only keep trades of at least this many lots
        #[arg(long)]
        min_lot: Option<Lot>,
    },
    /// Build the broker distribution graph, or query one broker
    Distribution {
        /// Ranked buyer list (JSON)
        #[arg(short, long)]
        input: PathBuf,
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        symbol: String,
        #[arg(long)]
        date: NaiveDate,
        #[arg(long, default_value = "value", value_parser = metric_arg)]
        metric: Metric,
        /// Print the sellers feeding this buyer
        #[arg(long, conflicts_with = "seller")]
        buyer: Option<String>,
        /// Print the buyers fed by this seller
        #[arg(long)]
        seller: Option<String>,
    },
}

#[derive(Serialize)]
struct TapeReport<'a> {
    request: &'a TradeTapeRequest,
    pages: usize,
    analysis: &'a TapeAnalysis,
    verdict: &'a Verdict,
}

#[derive(Serialize)]
struct GraphReport<'a> {
    request: &'a BrokerDistributionRequest,
    graph: &'a DistributionGraph,
    layout: &'a GraphLayout,
    bands: &'a [EdgeBand],
}

#[derive(Serialize)]
struct ForwardReport<'a> {
    request: &'a BrokerDistributionRequest,
    buyer: &'a str,
    sellers: &'a [DistributionEdge],
}

#[derive(Serialize)]
struct InverseReport<'a> {
    request: &'a BrokerDistributionRequest,
    seller: &'a str,
    total: u64,
    buyers: &'a [InverseAllocation],
}

/// Run a command and return its JSON output.
pub fn run(cli: Cli) -> Result<String> {
    match cli.command {
        Command::Tape {
            input,
            config,
            symbol,
            date,
            side,
            board,
            min_lot,
        } => {
            let config = load_config(config.as_deref())?;
            let mut request = TradeTapeRequest::new(symbol, date);
            request.side = side;
            request.board = board;
            request.min_lot = min_lot;
            run_tape(&input, request, &config)
        }
        Command::Distribution {
            input,
            config,
            symbol,
            date,
            metric,
            buyer,
            seller,
        } => {
            let config = load_config(config.as_deref())?;
            let request = BrokerDistributionRequest::new(symbol, date, metric);
            run_distribution(&input, request, &config, buyer.as_deref(), seller.as_deref())
        }
    }
}

fn run_tape(inputs: &[PathBuf], request: TradeTapeRequest, config: &Config) -> Result<String> {
    let analyzer = TapeAnalyzer::new(config.tape.clone())?;
    let synthesizer = VerdictSynthesizer::new(config.verdict.clone())?;

    let mut collector = TapeCollector::new(request);
    for path in inputs {
        let json = read(path)?;
        let page = TapePage::from_json(&json)
            .with_context(|| format!("invalid tape page {}", path.display()))?;
        collector
            .push_page(page)
            .with_context(|| format!("failed to collect {}", path.display()))?;
    }
    if !collector.is_complete() {
        warn!(
            cursor = collector.cursor().unwrap_or_default(),
            "last page has a next cursor, analyzing a partial tape"
        );
    }

    let analysis = analyzer.analyze_collected(&collector)?;
    let verdict = synthesizer.synthesize(&analysis);
    info!(
        symbol = %collector.request().symbol,
        trades = analysis.trade_count,
        verdict = ?verdict.kind,
        "tape analyzed"
    );

    let report = TapeReport {
        request: collector.request(),
        pages: collector.page_count(),
        analysis: &analysis,
        verdict: &verdict,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn run_distribution(
    input: &Path,
    request: BrokerDistributionRequest,
    config: &Config,
    buyer: Option<&str>,
    seller: Option<&str>,
) -> Result<String> {
    let json = read(input)?;
    let buyers = buyers_from_json(&json)
        .with_context(|| format!("invalid buyer list {}", input.display()))?;
    let graph = DistributionGraph::build(&buyers, &config.distribution)?;
    info!(
        symbol = %request.symbol,
        buyers = graph.buyers().len(),
        sellers = graph.sellers().len(),
        "distribution graph built"
    );

    if let Some(buyer) = buyer {
        let code = parse_broker_code(buyer)?;
        let report = ForwardReport {
            request: &request,
            buyer: &code,
            sellers: graph.query_forward(&code),
        };
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    if let Some(seller) = seller {
        let code = parse_broker_code(seller)?;
        let report = InverseReport {
            request: &request,
            seller: &code,
            total: graph.seller_total(&code),
            buyers: graph.query_inverse(&code),
        };
        return Ok(serde_json::to_string_pretty(&report)?);
    }

    let placed = layout(graph.buyers(), graph.sellers(), &config.layout);
    let bands = edge_bands(&graph, &placed);
    let report = GraphReport {
        request: &request,
        graph: &graph,
        layout: &placed,
        bands: &bands,
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => {
            let json = read(path)?;
            Config::from_json(&json)
                .with_context(|| format!("invalid config {}", path.display()))
        }
        None => Ok(Config::default()),
    }
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn side_arg(raw: &str) -> std::result::Result<Side, String> {
    parse_side(raw).map_err(|e| e.to_string())
}

fn board_arg(raw: &str) -> std::result::Result<MarketBoard, String> {
    parse_market_board(raw).map_err(|e| e.to_string())
}

fn metric_arg(raw: &str) -> std::result::Result<Metric, String> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "value" => Ok(Metric::Value),
        "volume" => Ok(Metric::Volume),
        _ => Err(format!("unknown metric: {raw}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_temp(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir()
            .join(format!("forensics-cli-{}-{name}", std::process::id()));
        fs::write(&path, contents).unwrap();
        path
    }

    const TAPE: &str = r#"[
        {"time": "10:00:00", "price": "1,000", "lot": "300", "side": "buy",
         "buyer_code": "AA", "seller_code": "XX", "buyer_type": "D", "seller_type": "D"},
        {"time": "10:00:01", "price": 1000, "lot": 400, "side": "buy",
         "buyer_code": "AA", "seller_code": "XX", "buyer_type": "D", "seller_type": "D"},
        {"time": "10:05:00", "price": "1000", "lot": "100", "side": "sell",
         "buyer_code": "YY", "seller_code": "BB", "buyer_type": "D", "seller_type": "D"}
    ]"#;

    const BUYERS: &str = r#"[
        {"code": "AK", "investor_type": "F", "amount": "900",
         "sellers": [{"seller_code": "YP", "seller_type": "D", "amount": 300},
                     {"seller_code": "CC", "seller_type": "D", "amount": 600}]},
        {"code": "BK", "investor_type": "D", "amount": 400,
         "sellers": [{"seller_code": "YP", "seller_type": "D", "amount": 400}]}
    ]"#;

    #[test]
    fn test_parse_tape_args() {
        let cli = Cli::try_parse_from([
            "forensics", "tape", "--input", "a.json", "b.json", "--symbol", "BBCA", "--date",
            "2024-03-01", "--side", "buy", "--board", "RG", "--min-lot", "10",
        ])
        .unwrap();
        match cli.command {
            Command::Tape {
                input,
                side,
                board,
                min_lot,
                date,
                ..
            } => {
                assert_eq!(input.len(), 2);
                assert_eq!(side, Some(Side::Buy));
                assert_eq!(board, Some(MarketBoard::Regular));
                assert_eq!(min_lot, Some(10));
                assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_buyer_and_seller_conflict() {
        let result = Cli::try_parse_from([
            "forensics", "distribution", "--input", "b.json", "--symbol", "BBCA", "--date",
            "2024-03-01", "--buyer", "AK", "--seller", "YP",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_rejects_unknown_side() {
        let result = Cli::try_parse_from([
            "forensics", "tape", "--input", "a.json", "--symbol", "BBCA", "--date", "2024-03-01",
            "--side", "hold",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_tape_report() {
        let path = write_temp("tape.json", TAPE);
        let request = TradeTapeRequest::new("BBCA", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let output = run_tape(&[path.clone()], request, &Config::default()).unwrap();
        fs::remove_file(path).ok();

        let report: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(report["pages"], 1);
        assert_eq!(report["analysis"]["buy_volume"], 700);
        assert_eq!(report["analysis"]["split_groups"][0]["broker_code"], "AA");
        assert_eq!(report["verdict"]["kind"], "BULLISH");
    }

    #[test]
    fn test_distribution_queries() {
        let path = write_temp("buyers.json", BUYERS);
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        let config = Config::default();

        let request = BrokerDistributionRequest::new("BBCA", date, Metric::Value);
        let inverse = run_distribution(&path, request.clone(), &config, None, Some("yp")).unwrap();
        let inverse: serde_json::Value = serde_json::from_str(&inverse).unwrap();
        assert_eq!(inverse["seller"], "YP");
        assert_eq!(inverse["total"], 700);
        assert_eq!(inverse["buyers"][0]["buyer_code"], "BK");

        let forward = run_distribution(&path, request.clone(), &config, Some("AK"), None).unwrap();
        let forward: serde_json::Value = serde_json::from_str(&forward).unwrap();
        assert_eq!(forward["sellers"][0]["seller_code"], "CC");

        let full = run_distribution(&path, request, &config, None, None).unwrap();
        fs::remove_file(path).ok();
        let full: serde_json::Value = serde_json::from_str(&full).unwrap();
        assert_eq!(full["bands"].as_array().unwrap().len(), 3);
        assert_eq!(full["layout"]["sellers"][0]["code"], "YP");
    }

    #[test]
    fn test_missing_input_has_context() {
        let request = TradeTapeRequest::new("BBCA", NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
        let err = run_tape(
            &[PathBuf::from("/nonexistent/forensics/tape.json")],
            request,
            &Config::default(),
        )
        .unwrap_err();
        assert!(format!("{err:#}").contains("failed to read"));
    }
}
