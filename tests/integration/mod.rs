// Copyright (c) 2026 Bountyy Oy. All rights reserved.
// This software is proprietary and confidential.

pub mod support;

mod dedup_tests;
mod delay_oracle_tests;
mod engine_tests;
