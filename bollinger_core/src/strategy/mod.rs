pub mod bollinger_strategy;
