pub(crate) mod history;
pub(crate) mod ignore;
pub(crate) mod next;
pub(crate) mod plan;
pub(crate) mod resolve;
pub(crate) mod scan;
pub(crate) mod score;
