// Output formatting — terminal display of run results.

pub mod terminal;
