//! An error from the host manager

/// An error from the host manager
#[derive(Debug)]
pub enum Error {
    /// An operation referenced a host that is not in the cache
    NotFound(String),
    /// A lease did not match or a host was not in the expected state
    InvalidArgument(String),
    /// A rate limit or quota was exhausted by a caller's policy layer
    ResourceExhausted(String),
    /// A generic error with a message
    Generic(String),
    /// An IO Error
    IO(std::io::Error),
    /// An error from loading a config
    Config(config::ConfigError),
    /// An error from converting a value with serde to YAML
    SerdeYaml(serde_yaml::Error),
}

impl Error {
    /// Create a new generic error
    ///
    /// # Arguments
    ///
    /// * `msg` - The error message to set
    pub fn new<T: Into<String>>(msg: T) -> Self {
        Error::Generic(msg.into())
    }

    /// Get the machine readable code for this error if one exists
    #[must_use]
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Error::NotFound(_) => Some("not-found"),
            Error::InvalidArgument(_) => Some("invalid-argument"),
            Error::ResourceExhausted(_) => Some("resource-exhausted"),
            _ => None,
        }
    }

    /// Get the error message for this error
    #[must_use]
    pub fn msg(&self) -> String {
        match self {
            Error::NotFound(msg)
            | Error::InvalidArgument(msg)
            | Error::ResourceExhausted(msg)
            | Error::Generic(msg) => msg.clone(),
            Error::IO(err) => err.to_string(),
            Error::Config(err) => err.to_string(),
            Error::SerdeYaml(err) => err.to_string(),
        }
    }

    /// Get the kind of error as a string
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::NotFound(_) => "NotFound",
            Error::InvalidArgument(_) => "InvalidArgument",
            Error::ResourceExhausted(_) => "ResourceExhausted",
            Error::Generic(_) => "Generic",
            Error::IO(_) => "IO",
            Error::Config(_) => "Config",
            Error::SerdeYaml(_) => "SerdeYaml",
        }
    }

    /// Check if this is a not found error
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Check if this is an invalid argument error
    #[must_use]
    pub fn is_invalid_argument(&self) -> bool {
        matches!(self, Error::InvalidArgument(_))
    }
}

impl std::fmt::Display for Error {
    /// display this error in a easy readble format
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self.code() {
            Some(code) => write!(f, "code:{} message:{}", code, self.msg()),
            None => write!(f, "Kind: {} Error: {}", self.kind(), self.msg()),
        }
    }
}

// mark that this is an error struct
impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(error: std::io::Error) -> Self {
        Error::IO(error)
    }
}

impl From<config::ConfigError> for Error {
    fn from(error: config::ConfigError) -> Self {
        Error::Config(error)
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(error: serde_yaml::Error) -> Self {
        Error::SerdeYaml(error)
    }
}

/// not found
#[macro_export]
macro_rules! not_found {
    ($($msg:tt)+) => {Err($crate::Error::NotFound(format!($($msg)+)))}
}

/// invalid argument
#[macro_export]
macro_rules! invalid {
    ($($msg:tt)+) => {Err($crate::Error::InvalidArgument(format!($($msg)+)))}
}

/// resource exhausted
#[macro_export]
macro_rules! exhausted {
    ($($msg:tt)+) => {Err($crate::Error::ResourceExhausted(format!($($msg)+)))}
}
