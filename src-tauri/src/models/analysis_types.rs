use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Tabular statistics as sent by the analysis service: either a plain
/// key/value mapping or a list of per-column records.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StatsTable {
    Mapping(Map<String, Value>),
    Records(Vec<Map<String, Value>>),
}

impl StatsTable {
    pub fn is_empty(&self) -> bool {
        match self {
            StatsTable::Mapping(map) => map.is_empty(),
            StatsTable::Records(rows) => rows.is_empty(),
        }
    }

    pub fn as_mapping(&self) -> Option<&Map<String, Value>> {
        match self {
            StatsTable::Mapping(map) => Some(map),
            StatsTable::Records(_) => None,
        }
    }
}

/// A base64-encoded PNG, passed through untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlotImage(pub String);

impl PlotImage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn data_uri(&self) -> String {
        format!("data:image/png;base64,{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct AnalysisResult {
    pub summary: Option<StatsTable>,
    pub descriptive_stats: Option<Map<String, Value>>,
    pub numerical_plot: Option<PlotImage>,
    pub categorical_plots: Option<BTreeMap<String, PlotImage>>,
    pub correlation_plot: Option<PlotImage>,
    pub filename: Option<String>,
    pub shape: Option<(u64, u64)>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlotSection {
    pub title: &'static str,
    /// `(caption, image)` pairs; the caption is the column name for categorical plots.
    pub images: Vec<(String, PlotImage)>,
}

impl AnalysisResult {
    /// Image sections in display order. Absent plots and an empty
    /// categorical mapping produce no section.
    pub fn plot_sections(&self) -> Vec<PlotSection> {
        let mut sections = Vec::new();

        if let Some(plot) = &self.numerical_plot {
            sections.push(PlotSection {
                title: "Numerical Distribution",
                images: vec![("Numerical Distribution".to_string(), plot.clone())],
            });
        }

        if let Some(plots) = self.categorical_plots.as_ref().filter(|p| !p.is_empty()) {
            sections.push(PlotSection {
                title: "Categorical Distributions",
                images: plots
                    .iter()
                    .map(|(column, plot)| (column.clone(), plot.clone()))
                    .collect(),
            });
        }

        if let Some(plot) = &self.correlation_plot {
            sections.push(PlotSection {
                title: "Correlation Heatmap",
                images: vec![("Correlation Heatmap".to_string(), plot.clone())],
            });
        }

        sections
    }
}
