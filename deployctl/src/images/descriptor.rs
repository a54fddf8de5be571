//! Fully-qualified container image coordinates

use std::fmt;
use std::str::FromStr;

use crate::errors::DeployError;

/// A container image resolved to `repository/name:tag`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageDescriptor {
    /// Registry host, e.g. `index.docker.io`
    pub repository: String,

    /// Image path within the registry, e.g. `library/hello-world`
    pub name: String,

    /// Image tag
    pub tag: String,
}

impl ImageDescriptor {
    pub fn new(
        repository: impl Into<String>,
        name: impl Into<String>,
        tag: impl Into<String>,
    ) -> Self {
        Self {
            repository: repository.into(),
            name: name.into(),
            tag: tag.into(),
        }
    }

    /// Check the coordinate is usable in a registry URL
    pub fn validate(&self) -> Result<(), DeployError> {
        let invalid = |msg: &str| -> Result<(), DeployError> {
            Err(DeployError::ValidationError(msg.to_string()))
        };

        if self.repository.is_empty() {
            return invalid("Image repository cannot be blank");
        }
        if self.repository.contains('/') {
            return invalid("Image repository cannot contain forward slashes");
        }
        if self.name.is_empty() {
            return invalid("Image name cannot be blank");
        }
        if self.name.starts_with('/') {
            return invalid("Image name cannot start with forward slash");
        }
        if self.name.ends_with('/') {
            return invalid("Image name cannot end with forward slash");
        }
        if self.tag.is_empty() {
            return invalid("Image tag cannot be blank");
        }
        if self.tag.contains(':') {
            return invalid("Image tag cannot contain colon");
        }
        Ok(())
    }
}

impl fmt::Display for ImageDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.repository, self.name, self.tag)
    }
}

impl FromStr for ImageDescriptor {
    type Err = DeployError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (repository, rest) = s.split_once('/').ok_or_else(|| {
            DeployError::ValidationError(format!("Image '{}' has no repository", s))
        })?;
        let (name, tag) = rest.rsplit_once(':').ok_or_else(|| {
            DeployError::ValidationError(format!("Image '{}' has no tag", s))
        })?;

        let image = ImageDescriptor::new(repository, name, tag);
        image.validate()?;
        Ok(image)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate() {
        let cases = [
            (ImageDescriptor::new("", "", ""), Some("Image repository cannot be blank")),
            (
                ImageDescriptor::new("a/b", "img", "1"),
                Some("Image repository cannot contain forward slashes"),
            ),
            (ImageDescriptor::new("index.docker.io", "", ""), Some("Image name cannot be blank")),
            (
                ImageDescriptor::new("index.docker.io", "/lib", "1"),
                Some("Image name cannot start with forward slash"),
            ),
            (
                ImageDescriptor::new("index.docker.io", "lib/", "1"),
                Some("Image name cannot end with forward slash"),
            ),
            (
                ImageDescriptor::new("index.docker.io", "library/hello-world", ""),
                Some("Image tag cannot be blank"),
            ),
            (
                ImageDescriptor::new("index.docker.io", "library/hello-world", "a:b"),
                Some("Image tag cannot contain colon"),
            ),
            (ImageDescriptor::new("index.docker.io", "library/hello-world", "latest"), None),
        ];

        for (i, (image, expected)) in cases.iter().enumerate() {
            match (image.validate(), expected) {
                (Ok(()), None) => {}
                (Err(DeployError::ValidationError(msg)), Some(expected)) => {
                    assert_eq!(&msg, expected, "case {}", i)
                }
                (result, expected) => panic!("case {}: got {:?}, expected {:?}", i, result, expected),
            }
        }
    }

    #[test]
    fn test_string_form() {
        let image = ImageDescriptor::new("localhost:5000", "team/api", "42-abc123");
        let text = image.to_string();
        assert_eq!(text, "localhost:5000/team/api:42-abc123");
        assert_eq!(text.parse::<ImageDescriptor>().unwrap(), image);
    }

    #[test]
    fn test_parse_without_tag() {
        let err = "index.docker.io/library/hello-world"
            .parse::<ImageDescriptor>()
            .unwrap_err();
        assert!(matches!(err, DeployError::ValidationError(_)));
    }
}
