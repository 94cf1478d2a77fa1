mod fault;
mod lookahead;
mod mocks;
mod sim_walk;
mod support_switch;
