//! Command-line surface: render a graph file to SVG (or a full artifact),
//! or merge several graph files with diagnostics.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::de::DeserializeOwned;

use crate::api;
use crate::layout::HierarchicalLayout;
use crate::merge::{self, GraphSource, MergeOptions, MergeRules};
use crate::model::{Graph, Theme};
use crate::render::render_svg;

#[derive(Parser)]
#[clap(name = "nettopo")]
#[clap(author = "NetTopo Contributors")]
#[clap(version = "1.0.0")]
#[clap(about = "Network topology layout and SVG rendering engine", long_about = None)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,

    #[clap(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Lay out a JSON graph and write SVG (or a sheet artifact).
    Render {
        #[clap(value_parser)]
        input: PathBuf,

        #[clap(short, long, value_parser)]
        output: Option<PathBuf>,

        /// Override the graph's theme (light or dark).
        #[clap(long)]
        theme: Option<String>,

        /// Emit the full multi-sheet artifact as JSON instead of one SVG.
        #[clap(long)]
        sheets: bool,
    },

    /// Merge a base graph with overlay graphs and print the result.
    Merge {
        /// Base graph first, then overlays.
        #[clap(value_parser, required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        /// Match strategy for overlays (id, name, attribute, manual).
        #[clap(long = "match")]
        match_by: Option<String>,

        /// Dotted metadata path for attribute matching.
        #[clap(long)]
        attribute: Option<String>,

        /// On-match behavior (merge-properties, keep-base, keep-overlay).
        #[clap(long)]
        on_match: Option<String>,

        /// On-unmatched behavior (add-to-root, add-to-subgraph, ignore).
        #[clap(long)]
        on_unmatched: Option<String>,
    },
}

pub struct CliRunner;

impl CliRunner {
    pub fn new(_cli: &Cli) -> Self {
        Self
    }

    pub async fn run(&self, command: Commands) -> Result<()> {
        match command {
            Commands::Render {
                input,
                output,
                theme,
                sheets,
            } => self.render(&input, output.as_deref(), theme.as_deref(), sheets).await,
            Commands::Merge {
                inputs,
                match_by,
                attribute,
                on_match,
                on_unmatched,
            } => self.merge(&inputs, match_by, attribute, on_match, on_unmatched),
        }
    }

    async fn render(
        &self,
        input: &Path,
        output: Option<&Path>,
        theme: Option<&str>,
        sheets: bool,
    ) -> Result<()> {
        let mut graph = read_graph(input)?;
        if let Some(theme) = theme {
            graph.settings.theme = parse_kebab::<Theme>(theme)
                .with_context(|| format!("unknown theme `{}`", theme))?;
        }

        let rendered = if sheets {
            let artifact = api::render_network(&graph).await;
            serde_json::to_string_pretty(&artifact)?
        } else {
            let engine = HierarchicalLayout::new();
            let layout = engine.layout_async(&graph).await;
            for warning in &layout.metadata.warnings {
                eprintln!("{} {}", "warning:".yellow(), warning);
            }
            for issue in &layout.metadata.issues {
                eprintln!("{} {}: {}", "skipped:".yellow(), issue.element, issue.reason);
            }
            render_svg(&graph, &layout)
        };

        match output {
            Some(path) => {
                std::fs::write(path, rendered)
                    .with_context(|| format!("cannot write {}", path.display()))?;
                println!("{} {}", "wrote".green(), path.display());
            }
            None => print!("{}", rendered),
        }
        Ok(())
    }

    fn merge(
        &self,
        inputs: &[PathBuf],
        match_by: Option<String>,
        attribute: Option<String>,
        on_match: Option<String>,
        on_unmatched: Option<String>,
    ) -> Result<()> {
        let has_rules =
            match_by.is_some() || on_match.is_some() || on_unmatched.is_some();
        let mut rules = MergeRules::default();
        if let Some(value) = &match_by {
            rules.match_by = parse_kebab(value)
                .with_context(|| format!("unknown match strategy `{}`", value))?;
        }
        rules.match_attribute = attribute;
        if let Some(value) = &on_match {
            rules.on_match = parse_kebab(value)
                .with_context(|| format!("unknown on-match strategy `{}`", value))?;
        }
        if let Some(value) = &on_unmatched {
            rules.on_unmatched = parse_kebab(value)
                .with_context(|| format!("unknown on-unmatched strategy `{}`", value))?;
        }

        let mut sources = Vec::with_capacity(inputs.len());
        for (index, path) in inputs.iter().enumerate() {
            let graph = read_graph(path)?;
            let name = path
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("source-{}", index));
            let mut source = GraphSource::new(name, graph);
            if index > 0 && has_rules {
                source = source.with_rules(rules.clone());
            }
            sources.push(source);
        }

        let result = merge::merge_graphs(&sources, &MergeOptions::default())?;
        for (name, stats) in &result.sources {
            eprintln!(
                "{} {}: {} nodes, {} links",
                "merged".green(),
                name,
                stats.accepted_nodes,
                stats.accepted_links
            );
        }
        for skip in result.skipped_nodes.iter().chain(&result.skipped_links) {
            eprintln!(
                "{} {} from {}: {}",
                "skipped".yellow(),
                skip.id,
                skip.source,
                skip.reason
            );
        }
        println!("{}", serde_json::to_string_pretty(&result.graph)?);
        Ok(())
    }
}

fn read_graph(path: &Path) -> Result<Graph> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("cannot read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("invalid graph in {}", path.display()))
}

/// Parse a kebab-case CLI value into any serde kebab-case enum.
fn parse_kebab<T: DeserializeOwned>(value: &str) -> Result<T> {
    serde_json::from_value(serde_json::Value::String(value.to_string()))
        .map_err(anyhow::Error::from)
}
