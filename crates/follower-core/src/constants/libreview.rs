// ABOUTME: LibreLinkUp follower API constants (paths, headers, payload formats)
// ABOUTME: Shared by the session client, the readings fetcher and URL normalization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 Pierre Fitness Intelligence

/// Provider name used in errors and logs
pub const PROVIDER_NAME: &str = "libreview";

/// Default regional endpoint offered when no URL has been configured
pub const DEFAULT_BASE_URL: &str = "https://api-eu.libreview.io";

/// Credential POST path
pub const LOGIN_PATH: &str = "/llu/auth/login";

/// Connection listing path
pub const CONNECTIONS_PATH: &str = "/llu/connections";

/// Suffix appended to `/llu/connections/{patientId}`
pub const GRAPH_SUFFIX: &str = "/graph";

/// Header naming the client product
pub const PRODUCT_HEADER: &str = "product";

/// Header naming the client version
pub const VERSION_HEADER: &str = "version";

/// `product` header value expected by the service
pub const PRODUCT_HEADER_VALUE: &str = "llu.ios";

/// `version` header value expected by the service
pub const VERSION_HEADER_VALUE: &str = "4.7.0";

/// Format of `FactoryTimestamp`, always expressed in GMT
pub const FACTORY_TIMESTAMP_FORMAT: &str = "%m/%d/%Y %I:%M:%S %p";

/// Case-insensitive marker of an expired bearer token
pub const EXPIRED_TOKEN_MARKER: &str = "expired jwt";

/// Failure detail used when login fails without a server message
pub const GENERIC_LOGIN_FAILURE: &str = "login failed";

/// Failure detail used when the server omits a message
pub const UNKNOWN_ERROR: &str = "unknown error";
