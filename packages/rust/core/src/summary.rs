//! Headline totals printed after every run.

use std::fmt;

use serde::Serialize;

use skillscope_shared::{PublisherAggregate, Skill};

use crate::pipeline::PipelineOutput;

/// Number of publishers listed in each ranking.
pub const SUMMARY_TOP: usize = 10;

/// One row of a publisher ranking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublisherRank {
    pub owner: String,
    pub count: usize,
    pub total_installs: u64,
}

impl From<&PublisherAggregate> for PublisherRank {
    fn from(agg: &PublisherAggregate) -> Self {
        Self {
            owner: agg.owner.clone(),
            count: agg.count,
            total_installs: agg.total_installs,
        }
    }
}

/// Dataset-wide totals and the top publishers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetSummary {
    pub skills: usize,
    pub publishers: usize,
    /// Sum of distinct repositories per publisher.
    pub repos: usize,
    pub total_installs: u64,
    pub top_by_installs: Vec<PublisherRank>,
    pub top_by_count: Vec<PublisherRank>,
}

impl DatasetSummary {
    /// Summarize a finished pipeline run.
    pub fn from_output(output: &PipelineOutput) -> Self {
        Self::new(&output.skills, &output.publishers, SUMMARY_TOP)
    }

    /// Summarize `skills` and their aggregates, keeping `top` rows per ranking.
    ///
    /// `publishers` is expected in aggregator order (total installs desc).
    pub fn new(skills: &[Skill], publishers: &[PublisherAggregate], top: usize) -> Self {
        let top_by_installs = publishers.iter().take(top).map(PublisherRank::from).collect();

        let mut by_count: Vec<&PublisherAggregate> = publishers.iter().collect();
        by_count.sort_by(|a, b| {
            b.count
                .cmp(&a.count)
                .then_with(|| b.total_installs.cmp(&a.total_installs))
                .then_with(|| a.owner.cmp(&b.owner))
        });
        let top_by_count = by_count
            .into_iter()
            .take(top)
            .map(PublisherRank::from)
            .collect();

        Self {
            skills: skills.len(),
            publishers: publishers.len(),
            repos: publishers.iter().map(|p| p.repos).sum(),
            total_installs: skills
                .iter()
                .fold(0u64, |acc, s| acc.saturating_add(s.installs)),
            top_by_installs,
            top_by_count,
        }
    }
}

impl fmt::Display for DatasetSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Skills:         {}", self.skills)?;
        writeln!(f, "Publishers:     {}", self.publishers)?;
        writeln!(f, "Repositories:   {}", self.repos)?;
        writeln!(f, "Total installs: {}", self.total_installs)?;

        writeln!(f)?;
        writeln!(f, "Top publishers by installs:")?;
        for (i, rank) in self.top_by_installs.iter().enumerate() {
            writeln!(
                f,
                "  {:>2}. {:<32} {:>12} installs  {:>5} skills",
                i + 1,
                rank.owner,
                rank.total_installs,
                rank.count
            )?;
        }

        writeln!(f)?;
        writeln!(f, "Top publishers by skill count:")?;
        for (i, rank) in self.top_by_count.iter().enumerate() {
            writeln!(
                f,
                "  {:>2}. {:<32} {:>5} skills  {:>12} installs",
                i + 1,
                rank.owner,
                rank.count,
                rank.total_installs
            )?;
        }
        Ok(())
    }
}
