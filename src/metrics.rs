// Copyright 2019-2022 ChainSafe Systems
// SPDX-License-Identifier: Apache-2.0, MIT

use lazy_static::lazy_static;
use prometheus::{Gauge, Histogram, HistogramOpts, Opts};

lazy_static! {
    pub static ref MAX_BLOCK: Box<Gauge> = {
        let gauge = Box::new(
            Gauge::with_opts(Opts::new(
                "block_manager_max_block",
                "High-water mark of allocated block ids",
            ))
            .unwrap(),
        );
        prometheus::default_registry()
            .register(gauge.clone())
            .expect("registering the block_manager_max_block metric must succeed");
        gauge
    };
    pub static ref FREE_LIST_LEN: Box<Gauge> = {
        let gauge = Box::new(
            Gauge::with_opts(Opts::new(
                "block_manager_free_list_len",
                "Number of block ids available for reuse",
            ))
            .unwrap(),
        );
        prometheus::default_registry()
            .register(gauge.clone())
            .expect("registering the block_manager_free_list_len metric must succeed");
        gauge
    };
    pub static ref USED_BLOCKS_LEN: Box<Gauge> = {
        let gauge = Box::new(
            Gauge::with_opts(Opts::new(
                "block_manager_used_blocks_len",
                "Number of block ids read since the last checkpoint",
            ))
            .unwrap(),
        );
        prometheus::default_registry()
            .register(gauge.clone())
            .expect("registering the block_manager_used_blocks_len metric must succeed");
        gauge
    };
    pub static ref CHECKPOINT_DURATION: Box<Histogram> = {
        let hist = Box::new(
            Histogram::with_opts(
                HistogramOpts::new(
                    "block_manager_checkpoint_duration_seconds",
                    "Wall-clock time spent in write_header",
                )
                .buckets(vec![
                    0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1., 5.,
                ]),
            )
            .unwrap(),
        );
        prometheus::default_registry()
            .register(hist.clone())
            .expect("registering the block_manager_checkpoint_duration_seconds metric must succeed");
        hist
    };
}
