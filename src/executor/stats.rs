//! Per-stage execution statistics
//!
//! Every stage owns a `CommonStats` and only that stage increments it.
//! `PlanStageStats` is a snapshot tree mirroring the plan, handed to the
//! caller on request. It serializes to JSON and renders as an explain tree.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// Kind of plan stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum StageType {
    /// Full scan of a record store
    CollectionScan,
    /// Projection of advanced documents
    Projection,
    /// Pre-loaded results, used to feed other stages
    QueuedData,
}

impl StageType {
    /// Returns the explain name of the stage
    pub fn as_str(&self) -> &'static str {
        match self {
            StageType::CollectionScan => "COLLSCAN",
            StageType::Projection => "PROJECTION",
            StageType::QueuedData => "QUEUED_DATA",
        }
    }
}

impl fmt::Display for StageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Counters every stage keeps
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommonStats {
    /// Calls to `work()`
    pub works: u64,
    /// Calls to `prepare_to_yield()`
    pub yields: u64,
    /// Calls to `recover_from_yield()`
    pub unyields: u64,
    /// Calls to `invalidate()`
    pub invalidates: u64,
    /// `Advanced` results returned
    pub advanced: u64,
    /// `NeedTime` results returned
    pub need_time: u64,
    /// `NeedFetch` results returned
    pub need_fetch: u64,
    /// `is_eof()` at the time the snapshot was taken
    pub is_eof: bool,
}

/// Stage specific counters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum SpecificStats {
    /// Stage keeps no extra counters
    None,
    /// Collection scan counters
    CollectionScan {
        /// Records read and tested against the filter
        docs_tested: u64,
        /// Whether the scan follows new inserts
        tailable: bool,
        /// The filter applied to each record
        #[serde(skip_serializing_if = "Option::is_none")]
        filter: Option<Value>,
    },
    /// Projection details
    Projection {
        /// The projection object
        projection: Value,
    },
}

/// Snapshot of a stage and its children
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlanStageStats {
    /// Stage type
    pub stage_type: StageType,
    /// Common counters
    pub common: CommonStats,
    /// Stage specific counters
    pub specific: SpecificStats,
    /// Child subtrees, in child order
    pub children: Vec<PlanStageStats>,
}

impl PlanStageStats {
    /// Creates a leaf snapshot
    pub fn new(stage_type: StageType, common: CommonStats) -> Self {
        Self {
            stage_type,
            common,
            specific: SpecificStats::None,
            children: Vec::new(),
        }
    }

    /// Attaches stage specific counters (builder style)
    pub fn with_specific(mut self, specific: SpecificStats) -> Self {
        self.specific = specific;
        self
    }

    /// Appends a child subtree (builder style)
    pub fn with_child(mut self, child: PlanStageStats) -> Self {
        self.children.push(child);
        self
    }

    /// Finds the first node of the given type, depth first
    pub fn find(&self, stage_type: StageType) -> Option<&PlanStageStats> {
        if self.stage_type == stage_type {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(stage_type))
    }

    /// Returns the number of nodes in the tree
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(PlanStageStats::node_count).sum::<usize>()
    }

    /// Serializes the tree for diagnostics
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    fn fmt_node(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let c = &self.common;
        write!(
            f,
            "{:indent$}{} works={} advanced={} needTime={} needFetch={} \
             yields={} unyields={} invalidates={} eof={}",
            "",
            self.stage_type,
            c.works,
            c.advanced,
            c.need_time,
            c.need_fetch,
            c.yields,
            c.unyields,
            c.invalidates,
            c.is_eof,
            indent = depth * 2
        )?;
        match &self.specific {
            SpecificStats::None => {}
            SpecificStats::CollectionScan {
                docs_tested,
                tailable,
                filter,
            } => {
                write!(f, " docsTested={} tailable={}", docs_tested, tailable)?;
                if let Some(filter) = filter {
                    write!(f, " filter={}", filter)?;
                }
            }
            SpecificStats::Projection { projection } => write!(f, " projection={}", projection)?,
        }
        writeln!(f)?;

        for child in &self.children {
            child.fmt_node(f, depth + 1)?;
        }
        Ok(())
    }
}

impl fmt::Display for PlanStageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.fmt_node(f, 0)
    }
}
