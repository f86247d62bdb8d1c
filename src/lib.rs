// Gleaner: frequent-term analysis for document corpora.
//
// This is the library root. Each module corresponds to a stage of the
// term-frequency pipeline, leaf-first: normalize -> count -> dispatch ->
// aggregate, with the coordinator driving a run end to end.

pub mod aggregate;
pub mod config;
pub mod coordinator;
pub mod corpus;
pub mod count;
pub mod dispatch;
pub mod normalize;
pub mod output;
