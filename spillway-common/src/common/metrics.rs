// Copyright 2025 OPPO.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::{try_err, CommonResult};
use once_cell::sync::Lazy;
use prometheus::{Counter, CounterVec, Gauge, GaugeVec, Opts, Registry, TextEncoder};

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

pub struct Metrics;

impl Metrics {
    pub fn new_counter<T: Into<String>>(name: T, help: T) -> CommonResult<Counter> {
        let counter = try_err!(Counter::with_opts(Opts::new(name, help)));
        try_err!(REGISTRY.register(Box::new(counter.clone())));
        Ok(counter)
    }

    pub fn new_counter_vec<T: Into<String>>(
        name: T,
        help: T,
        labels: &[&str],
    ) -> CommonResult<CounterVec> {
        let counter = try_err!(CounterVec::new(Opts::new(name, help), labels));
        try_err!(REGISTRY.register(Box::new(counter.clone())));
        Ok(counter)
    }

    pub fn new_gauge<T: Into<String>>(name: T, help: T) -> CommonResult<Gauge> {
        let gauge = try_err!(Gauge::with_opts(Opts::new(name, help)));
        try_err!(REGISTRY.register(Box::new(gauge.clone())));
        Ok(gauge)
    }

    pub fn new_gauge_vec<T: Into<String>>(
        name: T,
        help: T,
        labels: &[&str],
    ) -> CommonResult<GaugeVec> {
        let gauge = try_err!(GaugeVec::new(Opts::new(name, help), labels));
        try_err!(REGISTRY.register(Box::new(gauge.clone())));
        Ok(gauge)
    }

    pub fn text_output() -> CommonResult<String> {
        let encoder = TextEncoder::new();
        let text = try_err!(encoder.encode_to_string(&REGISTRY.gather()));
        Ok(text)
    }

    pub fn registry() -> &'static Registry {
        &REGISTRY
    }
}

#[cfg(test)]
mod tests {
    use crate::common::Metrics;
    use crate::CommonResult;

    #[test]
    fn counter() -> CommonResult<()> {
        let counter = Metrics::new_counter("test_counter", "test counter")?;
        counter.inc_by(3.0);

        let text = Metrics::text_output()?;
        assert!(text.contains("test_counter 3"));

        Ok(())
    }
}
