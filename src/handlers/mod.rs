// Handlers are grouped by the scope they run under:
// public (none) → protected (one organization or `all`) → elevated (administration)

pub mod elevated;
pub mod protected;
pub mod public;
