use strum_macros::{Display, EnumString};
use thiserror::Error;

/// Error codes for the backtester
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[repr(i32)]
pub enum ErrCode {
    // Parameter and config errors (0-99)
    #[strum(serialize = "_PARA_ERR_BEGIN")]
    ParaErrBegin = 0,
    #[strum(serialize = "PARA_ERROR")]
    ParaError = 5,
    #[strum(serialize = "CONFIG_ERROR")]
    ConfigError = 17,
    #[strum(serialize = "_PARA_ERR_END")]
    ParaErrEnd = 99,

    // Run errors (100-199)
    #[strum(serialize = "_RUN_ERR_BEGIN")]
    RunErrBegin = 100,
    #[strum(serialize = "SIGNAL_NOT_ALIGNED")]
    SignalNotAligned = 101,
    #[strum(serialize = "NO_SUCCESSFUL_RUN")]
    NoSuccessfulRun = 102,
    #[strum(serialize = "_RUN_ERR_END")]
    RunErrEnd = 199,

    // Price data errors (200-299)
    #[strum(serialize = "_DATA_ERR_BEGIN")]
    DataErrBegin = 200,
    #[strum(serialize = "PRICE_BELOW_ZERO")]
    PriceBelowZero = 201,
    #[strum(serialize = "SRC_DATA_NOT_FOUND")]
    SrcDataNotFound = 202,
    #[strum(serialize = "SRC_DATA_FORMAT_ERROR")]
    SrcDataFormatError = 203,
    #[strum(serialize = "DATES_NOT_MONOTONOUS")]
    DatesNotMonotonous = 206,
    #[strum(serialize = "NO_DATA")]
    NoData = 210,
    #[strum(serialize = "_DATA_ERR_END")]
    DataErrEnd = 299,
}

impl ErrCode {
    pub fn is_para_err(&self) -> bool {
        let code = *self as i32;
        code > Self::ParaErrBegin as i32 && code < Self::ParaErrEnd as i32
    }

    pub fn is_data_err(&self) -> bool {
        let code = *self as i32;
        code > Self::DataErrBegin as i32 && code < Self::DataErrEnd as i32
    }
}

#[derive(Debug, Error)]
#[error("{errcode}: {msg}")]
pub struct BacktestError {
    pub errcode: ErrCode,
    pub msg: String,
}

impl BacktestError {
    pub fn new(message: impl Into<String>, code: ErrCode) -> Self {
        Self {
            errcode: code,
            msg: message.into(),
        }
    }

    pub fn no_data(message: impl Into<String>) -> Self {
        Self::new(message, ErrCode::NoData)
    }

    pub fn is_para_err(&self) -> bool {
        self.errcode.is_para_err()
    }

    pub fn is_data_err(&self) -> bool {
        self.errcode.is_data_err()
    }

    /// True when the input simply had nothing to backtest.
    pub fn is_no_data(&self) -> bool {
        self.errcode == ErrCode::NoData
    }
}

impl From<csv::Error> for BacktestError {
    fn from(err: csv::Error) -> Self {
        Self::new(err.to_string(), ErrCode::SrcDataFormatError)
    }
}

impl From<serde_json::Error> for BacktestError {
    fn from(err: serde_json::Error) -> Self {
        Self::new(err.to_string(), ErrCode::ConfigError)
    }
}
