// fn main not required
mod ai_decisions;
mod health_check;
mod helpers;
mod pending_messages;
mod tickets;
