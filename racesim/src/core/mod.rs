pub mod arrival;
pub mod coordinator;
pub mod handle_race;
pub mod participant;
pub mod participant_worker;
pub mod race_control;
pub mod start_controller;
pub mod track;
