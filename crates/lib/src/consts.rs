//! Well-known names shared with the solving backend and image consumers.

/// Artifact filename used when the `file` build option is absent.
pub const DEFAULT_ARTIFACT_FILE: &str = "Poem";

/// Build option naming the artifact file.
pub const OPT_FILE: &str = "file";

/// Build option overriding the base image locator.
pub const OPT_BASE_IMAGE: &str = "base-image";

/// Build option overriding the cache-sharing hint for the artifact read.
pub const OPT_SHARED_KEY_HINT: &str = "shared-key-hint";

/// Result metadata key holding the JSON image config.
pub const META_IMAGE_CONFIG: &str = "containerimage.config";

/// Local source the artifact is read from.
pub const LOCAL_CONTEXT_NAME: &str = "dockerfile";

pub const DEFAULT_BASE_IMAGE: &str = "docker-image://docker.io/library/alpine:latest@sha256:c5b1261d6d3e43071626931fc004f70149baeba2c8ec672bd4f27761f8e1ad6b";

/// Description keys written by [`crate::llb::LayerConfig::description`].
pub const DESC_DOCKERFILE_COMMAND: &str = "com.docker.dockerfile.v1.command";
pub const DESC_CUSTOM_NAME: &str = "llb.customname";

pub const READ_ARTIFACT_NAME: &str = "[internal] reading the Poem";
