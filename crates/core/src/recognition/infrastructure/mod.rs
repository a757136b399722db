pub mod greedy_matcher;
pub mod optimal_matcher;
