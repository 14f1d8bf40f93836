//! Behaviour-driven step definitions driving the optimize CLI scenarios.

use super::helpers::{StubLegProviderBuilder, THREE_ORDERS_JSON, utf8_tempdir, write_utf8};
use super::*;
use crate::optimize::{DefaultLegProviderBuilder, LegProviderBuilder, run_optimize_with};
use camino::Utf8PathBuf;
use dispatch_engine::InputError;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use serde_json::Value;
use std::cell::RefCell;
use tempfile::TempDir;

#[derive(Debug)]
struct OptimizeWorld {
    _tmp: TempDir,
    request_path: Utf8PathBuf,
    include_request: RefCell<bool>,
    offline: RefCell<bool>,
    cli_args: RefCell<Vec<String>>,
    stdout: RefCell<Vec<u8>>,
    result: RefCell<Option<Result<(), CliError>>>,
}

impl OptimizeWorld {
    fn new() -> Self {
        let (tmp, root) = utf8_tempdir();
        Self {
            _tmp: tmp,
            request_path: root.join("request.json"),
            include_request: RefCell::new(true),
            offline: RefCell::new(false),
            cli_args: RefCell::new(Vec::new()),
            stdout: RefCell::new(Vec::new()),
            result: RefCell::new(None),
        }
    }

    fn build_command_line(&self) -> Vec<String> {
        let mut argv = vec!["dispatch".to_owned(), "optimize".to_owned()];
        if *self.include_request.borrow() {
            argv.push(self.request_path.as_str().to_owned());
        }
        argv.push(format!("--{ARG_TOUR_TIME_LIMIT_MS}=100"));
        argv.extend(self.cli_args.borrow().iter().cloned());
        argv
    }

    fn push_args(&self, args: &[String]) {
        self.cli_args.borrow_mut().extend_from_slice(args);
    }

    fn error(&self) -> std::cell::Ref<'_, CliError> {
        std::cell::Ref::map(self.result.borrow(), |result| {
            result
                .as_ref()
                .expect("result recorded")
                .as_ref()
                .expect_err("expected error")
        })
    }

    fn plan(&self) -> Value {
        let borrowed = self.result.borrow();
        let result = borrowed.as_ref().expect("result recorded");
        if let Err(err) = result {
            panic!("expected success, found {err:?}");
        }
        let stdout = String::from_utf8(self.stdout.borrow().clone()).expect("stdout utf-8");
        serde_json::from_str(&stdout).expect("output should be a JSON plan")
    }
}

#[fixture]
fn world() -> OptimizeWorld {
    OptimizeWorld::new()
}

#[given("a request with three light orders exists on disk")]
fn three_light_orders(#[from(world)] world: &OptimizeWorld) {
    write_utf8(&world.request_path, THREE_ORDERS_JSON.as_bytes());
}

#[given("the truck capacity is {capacity:u32} kg")]
fn truck_capacity(#[from(world)] world: &OptimizeWorld, capacity: u32) {
    world.push_args(&[format!("--{ARG_CAPACITY_KG}"), capacity.to_string()]);
}

#[given("strict fleet capacity checking is enabled")]
fn strict_fleet_capacity(#[from(world)] world: &OptimizeWorld) {
    world.push_args(&[format!("--{ARG_STRICT_FLEET_CAPACITY}")]);
}

#[given("the request contains invalid JSON")]
fn request_contains_invalid_json(#[from(world)] world: &OptimizeWorld) {
    write_utf8(&world.request_path, b"{ not valid json");
}

#[given("the request contains no orders")]
fn request_contains_no_orders(#[from(world)] world: &OptimizeWorld) {
    write_utf8(&world.request_path, br#"{ "orders": [], "truck_count": 2 }"#);
}

#[given("I omit the request path")]
fn omit_request_path(#[from(world)] world: &OptimizeWorld) {
    *world.include_request.borrow_mut() = false;
}

#[given("I ask for a sample of {count:u32} orders in offline mode")]
fn sample_offline(#[from(world)] world: &OptimizeWorld, count: u32) {
    *world.offline.borrow_mut() = true;
    world.push_args(&[
        format!("--{ARG_SAMPLE}"),
        count.to_string(),
        format!("--{ARG_SEED}"),
        "7".to_owned(),
        format!("--{ARG_OFFLINE}"),
    ]);
}

#[when("I run the optimize command")]
fn run_optimize_command(#[from(world)] world: &OptimizeWorld) {
    let invocation = world.build_command_line();
    let parsed = Cli::try_parse_from(invocation).map_err(CliError::from);
    let builder: &dyn LegProviderBuilder = if *world.offline.borrow() {
        &DefaultLegProviderBuilder
    } else {
        &StubLegProviderBuilder
    };
    let outcome = parsed.and_then(|cli| match cli.command {
        Command::Optimize(args) => {
            let mut buffer = world.stdout.borrow_mut();
            run_optimize_with(args, builder, &mut *buffer)
        }
    });
    world.result.replace(Some(outcome));
}

#[then("the command succeeds and prints a plan for {count:u32} orders")]
fn command_prints_plan(#[from(world)] world: &OptimizeWorld, count: u32) {
    let plan = world.plan();
    assert_eq!(plan["order_count"], count);
    let routed: usize = plan["routes"]
        .as_array()
        .expect("routes array")
        .iter()
        .map(|route| route["stop_sequence"].as_array().map_or(0, Vec::len))
        .sum();
    let unassigned = plan["unassigned_order_ids"]
        .as_array()
        .map_or(0, Vec::len);
    assert_eq!(
        u32::try_from(routed + unassigned).expect("small count"),
        count
    );
}

#[then("no leg in the plan is an estimate")]
fn no_estimated_legs(#[from(world)] world: &OptimizeWorld) {
    let plan = world.plan();
    let routes = plan["routes"].as_array().expect("routes array");
    assert!(!routes.is_empty());
    assert!(routes.iter().all(|route| route["has_fallback"] == false));
}

#[then("exactly {count:u32} order is unassigned")]
fn unassigned_count(#[from(world)] world: &OptimizeWorld, count: u32) {
    let plan = world.plan();
    let unassigned = plan["unassigned_order_ids"]
        .as_array()
        .expect("unassigned array");
    assert_eq!(u32::try_from(unassigned.len()).expect("small count"), count);
}

#[then("the command fails because the fleet is too small")]
fn command_fails_fleet_capacity(#[from(world)] world: &OptimizeWorld) {
    match &*world.error() {
        CliError::FleetCapacityExceeded { trucks, .. } => assert_eq!(*trucks, 1),
        other => panic!("expected FleetCapacityExceeded, found {other:?}"),
    }
}

#[then("the command fails because the request JSON is invalid")]
fn command_fails_invalid_json(#[from(world)] world: &OptimizeWorld) {
    match &*world.error() {
        CliError::ParseRequest { path, .. } => assert_eq!(*path, world.request_path),
        other => panic!("expected ParseRequest, found {other:?}"),
    }
}

#[then("the command fails because the request has no orders")]
fn command_fails_no_orders(#[from(world)] world: &OptimizeWorld) {
    match &*world.error() {
        CliError::InvalidRequest(source) => assert_eq!(*source, InputError::NoOrders),
        other => panic!("expected InvalidRequest, found {other:?}"),
    }
    assert!(world.stdout.borrow().is_empty());
}

#[then("the command fails because the request path is missing")]
fn command_fails_missing_request_path(#[from(world)] world: &OptimizeWorld) {
    match &*world.error() {
        CliError::MissingArgument { field, .. } => assert_eq!(*field, ARG_REQUEST),
        other => panic!("expected MissingArgument, found {other:?}"),
    }
}

macro_rules! register_optimize_scenario {
    ($fn_name:ident, $scenario_title:literal) => {
        #[scenario(path = "tests/features/optimize_command.feature", name = $scenario_title)]
        fn $fn_name(#[from(world)] world: OptimizeWorld) {
            let _ = world;
        }
    };
}

register_optimize_scenario!(optimize_happy_path, "planning a request from JSON");
register_optimize_scenario!(optimize_overweight, "leaving an overweight order unassigned");
register_optimize_scenario!(
    optimize_strict_fleet_capacity,
    "rejecting an overweight batch under strict fleet capacity"
);
register_optimize_scenario!(optimize_invalid_json, "rejecting invalid JSON input");
register_optimize_scenario!(optimize_no_orders, "rejecting an empty order list");
register_optimize_scenario!(optimize_missing_request, "rejecting missing request paths");
register_optimize_scenario!(optimize_sample_offline, "planning a generated sample offline");
