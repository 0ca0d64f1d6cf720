use std::{io, path::PathBuf};

/// Retrieves the text behind a catalog or prompt location.
pub trait Fetch {
    /// Fetches the full text at `location`.
    ///
    /// # Errors
    ///
    /// Returns an error if the location cannot be reached or read.
    fn fetch_text(&self, location: &str) -> Result<String, FetchError>;
}

impl<F> Fetch for F
where
    F: Fn(&str) -> Result<String, FetchError>,
{
    fn fetch_text(&self, location: &str) -> Result<String, FetchError> {
        self(location)
    }
}

/// Fetches `http(s)://` locations over the network and reads everything else
/// from disk, relative to a root directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFetcher {
    root: PathBuf,
}

impl SourceFetcher {
    /// Creates a fetcher resolving relative paths against `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

/// Whether a location refers to a remote resource.
#[must_use]
pub fn is_remote(location: &str) -> bool {
    let lowered = location.trim_start().to_ascii_lowercase();
    lowered.starts_with("http://") || lowered.starts_with("https://")
}

impl Fetch for SourceFetcher {
    fn fetch_text(&self, location: &str) -> Result<String, FetchError> {
        if is_remote(location) {
            tracing::debug!(location, "Fetching over HTTP");
            let response = ureq::get(location).call().map_err(|e| match e {
                ureq::Error::Status(status, _) => FetchError::Status {
                    status,
                    location: location.to_string(),
                },
                ureq::Error::Transport(transport) => FetchError::Transport {
                    location: location.to_string(),
                    message: transport.to_string(),
                },
            })?;
            return response.into_string().map_err(|source| FetchError::Io {
                path: PathBuf::from(location),
                source,
            });
        }

        let path = self.root.join(location);
        tracing::debug!(path = %path.display(), "Reading from disk");
        std::fs::read_to_string(&path).map_err(|source| FetchError::Io { path, source })
    }
}

/// The ways a fetch can fail.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    /// The server answered with a non-success status.
    #[error("fetch failed ({status}) for {location}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// The requested URL.
        location: String,
    },

    /// The server could not be reached.
    #[error("could not reach {location}: {message}")]
    Transport {
        /// The requested URL.
        location: String,
        /// Description of the transport failure.
        message: String,
    },

    /// The content could not be read.
    #[error("failed to read {}", path.display())]
    Io {
        /// The file (or URL) being read.
        path: PathBuf,
        /// The underlying error.
        source: io::Error,
    },
}

#[cfg(test)]
mod tests {
    use test_case::test_case;

    use super::*;

    #[test_case("https://example.com/ideas.csv", true; "https")]
    #[test_case("HTTP://example.com", true; "uppercase scheme")]
    #[test_case("data/ideas.csv", false; "relative path")]
    #[test_case("/srv/ideas.json", false; "absolute path")]
    fn detects_remote_locations(location: &str, expected: bool) {
        assert_eq!(is_remote(location), expected);
    }

    #[test]
    fn reads_relative_to_root() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir(tmp.path().join("data")).unwrap();
        std::fs::write(tmp.path().join("data/ideas.csv"), "title\nWalk\n").unwrap();

        let fetcher = SourceFetcher::new(tmp.path());

        assert_eq!(
            fetcher.fetch_text("data/ideas.csv").unwrap(),
            "title\nWalk\n"
        );
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let tmp = tempfile::tempdir().unwrap();
        let fetcher = SourceFetcher::new(tmp.path());

        let error = fetcher.fetch_text("nope.csv").unwrap_err();

        assert!(matches!(error, FetchError::Io { .. }));
        assert!(error.to_string().contains("nope.csv"));
    }

    #[test]
    fn closures_fetch() {
        let fetcher =
            |location: &str| -> Result<String, FetchError> { Ok(format!("from {location}")) };
        assert_eq!(fetcher.fetch_text("x").unwrap(), "from x");
    }
}
