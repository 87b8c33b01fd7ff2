mod cli;
mod fixture;
