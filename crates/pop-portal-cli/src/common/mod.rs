// SPDX-License-Identifier: GPL-3.0

/// Contains utilities for prompting parameter values.
pub(crate) mod prompt;
/// Contains utilities for opening and connecting the session.
pub(crate) mod session;
/// Contains utilities for signing and following transactions.
pub(crate) mod transaction;
