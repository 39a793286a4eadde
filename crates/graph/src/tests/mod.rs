//! End-to-end orchestration tests with scripted collaborators.
