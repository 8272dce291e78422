pub mod accounts;
pub mod audit;
pub mod dashboard;
pub mod health;
pub mod payments;
pub mod resources;

#[cfg(test)]
mod test_state;
