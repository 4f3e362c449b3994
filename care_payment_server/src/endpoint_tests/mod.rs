mod helpers;
mod ledger;
mod triggers;
