// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod error;
mod plan;
mod rank;
mod route;

pub use error::{NoViableReason, NoViableRoute};
pub use plan::{plan, Plan, PlanOptions, RejectedRoute};
pub use rank::{
    filter_viable, rank, select, Annotation, Preference, RankedRoute, RouteStatus,
    UnknownPreference,
};
pub use route::{EvaluatedRoute, RouteCandidate};
