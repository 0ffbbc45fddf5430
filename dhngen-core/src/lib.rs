//! Synthetic district heating network topology generator.
//!
//! Builds connected, bounded-degree pipe networks made of several regions,
//! marks a spaced-out subset of nodes as heat producers, removes short cycles
//! and embeds the result in the plane. All randomness comes from the caller's
//! [`rand::Rng`], so a seeded generator reproduces a network exactly.

mod assembler;
mod connectivity;
mod cycles;
mod error;
mod geometry;
mod graph;
mod layout;
mod params;
mod region;
mod topology;
mod union_find;
mod weights;

pub use crate::{
    assembler::TopologyAssembler,
    connectivity::{ConnectivityRepairer, RepairReport},
    cycles::{
        Cycle, CycleOutcome, CycleRepairReport, CycleRepairer, CycleSearch, find_cycle_through,
    },
    error::{
        ConnectivityError, ConnectivityErrorCode, GenerationError, GenerationErrorCode,
        LayoutError, LayoutErrorCode, ParamsError, ParamsErrorCode, Result,
    },
    geometry::Position,
    graph::{Edge, EdgeInsertion, EdgeRemoval, Graph},
    layout::{ForceDirectedLayout, LayoutProvider, validate_layout},
    params::{
        BackfillBoundary, DEFAULT_ANCHORS, GeneratorParams, GeneratorParamsBuilder, RetryBudget,
    },
    region::{BuiltRegion, RegionBuilder, edge_ratio},
    topology::{Node, Pipe, Region, Topology, TopologyStats},
    weights::{EdgeWeights, PropertyRange},
};
