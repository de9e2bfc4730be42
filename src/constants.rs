//! # System Constants
//!
//! Broker topology names, document collections and wire field names shared
//! with the external worker. These names are part of the worker contract and
//! must stay stable.

/// Broker topology used for command dispatch
pub mod broker {
    /// Durable topic exchange all commands are published to
    pub const EXCHANGE_TOPIC_ROUTER: &str = "topic.router";

    /// Durable inbound queue the external worker consumes
    pub const QUEUE_PLATFORM_FROM_SERVICE: &str = "queue.platform.fromService";

    /// Binding key connecting the command queue to the topic exchange
    pub const BINDING_PLATFORM_FROM_SERVICE: &str = "platform.fromService.#";

    pub const ROUTE_IMAGE_BUILD: &str = "platform.fromService.imageCreate";
    pub const ROUTE_CHALLENGE_CREATE: &str = "platform.fromService.challengeCreate";
    pub const ROUTE_CHALLENGE_START: &str = "platform.fromService.challengeStart";

    pub const CONTENT_TYPE_JSON: &str = "application/json";

    /// AMQP delivery mode 2
    pub const DELIVERY_MODE_PERSISTENT: u8 = 2;
}

/// Document store collection names
pub mod collections {
    pub const IMAGE: &str = "image";
    pub const CHALLENGE: &str = "challenge";
    pub const ATTEMPT: &str = "attempt";
    /// Append-only status log written by the external worker
    pub const PROCESS_ENGINE: &str = "process_engine";
}

/// Document field names used in store filters
pub mod fields {
    pub const COR_ID: &str = "corId";
    pub const CREATOR_NAME: &str = "creatorName";
    pub const IMAGE_NAME: &str = "imageName";
    pub const IMAGE_TAG: &str = "imageTag";
    pub const CHALLENGE_NAME: &str = "challengeName";
    pub const TOKEN: &str = "token";
    pub const TIMESTAMP: &str = "timestamp";
}

/// Prefix under which uploaded image archives are stored
pub const IMAGE_ARCHIVE_PREFIX: &str = "challenge-zips";
