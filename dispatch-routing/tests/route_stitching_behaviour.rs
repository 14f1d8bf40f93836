//! Behavioural tests for `RouteStitcher`.
//!
//! Steps drive the async stitcher on a paused current-thread runtime so
//! retry backoff completes instantly.

use std::cell::RefCell;
use std::sync::Arc;

use dispatch_core::{LegError, Order, RouteLeg};
use dispatch_routing::test_support::{FailingProvider, StubLegProvider};
use dispatch_routing::{LegCache, RouteStitcher, StitchedRoute};
use geo::Coord;
use rstest::fixture;
use rstest_bdd_macros::{given, scenario, then, when};
use tokio::runtime::{Builder, Runtime};

const DEPOT: Coord<f64> = Coord {
    x: -86.7816,
    y: 36.1627,
};

#[derive(Debug)]
enum ServiceChoice {
    Answering(Arc<StubLegProvider>),
    Failing(Arc<FailingProvider>),
}

impl ServiceChoice {
    fn calls(&self) -> usize {
        match self {
            Self::Answering(provider) => provider.calls(),
            Self::Failing(provider) => provider.calls(),
        }
    }
}

#[derive(Debug)]
struct StitchWorld {
    runtime: Runtime,
    service: RefCell<Option<ServiceChoice>>,
    route: RefCell<Option<StitchedRoute>>,
    legs: RefCell<Vec<RouteLeg>>,
}

impl StitchWorld {
    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn calls(&self) -> usize {
        self.service
            .borrow()
            .as_ref()
            .expect("service should be chosen before assertions")
            .calls()
    }

    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn expect_route(&self) -> StitchedRoute {
        self.route
            .borrow()
            .clone()
            .expect("route should be stitched before assertions")
    }

    #[expect(
        clippy::expect_used,
        reason = "behaviour tests use expect for readable failures"
    )]
    fn stitch(&self, stops: &[Order]) -> StitchedRoute {
        let service = self.service.borrow();
        let cache = Arc::new(LegCache::default());
        match service.as_ref().expect("service should be chosen") {
            ServiceChoice::Answering(provider) => {
                let stitcher = RouteStitcher::new(Arc::clone(provider)).with_cache(cache);
                self.runtime.block_on(stitcher.stitch(DEPOT, stops))
            }
            ServiceChoice::Failing(provider) => {
                let stitcher = RouteStitcher::new(Arc::clone(provider)).with_cache(cache);
                self.runtime.block_on(stitcher.stitch(DEPOT, stops))
            }
        }
    }

    fn fetch_twice(&self) -> Vec<RouteLeg> {
        let service = self.service.borrow();
        let Some(ServiceChoice::Answering(provider)) = service.as_ref() else {
            panic!("repeat requests need an answering service");
        };
        let stitcher = RouteStitcher::new(Arc::clone(provider))
            .with_cache(Arc::new(LegCache::default()));
        let to = Coord {
            x: -86.75,
            y: 36.17,
        };
        let first = self.runtime.block_on(stitcher.leg(DEPOT, to));
        let second = self.runtime.block_on(stitcher.leg(DEPOT, to));
        vec![first, second]
    }
}

#[expect(
    clippy::expect_used,
    reason = "behaviour tests use expect for readable failures"
)]
fn paused_runtime() -> Runtime {
    Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .expect("runtime should build")
}

#[fixture]
fn world() -> StitchWorld {
    StitchWorld {
        runtime: paused_runtime(),
        service: RefCell::new(None),
        route: RefCell::new(None),
        legs: RefCell::new(Vec::new()),
    }
}

fn two_stops() -> Vec<Order> {
    vec![
        Order::new("north", 36.20, -86.78, 50.0),
        Order::new("east", 36.16, -86.70, 50.0),
    ]
}

#[given("a routing service that always answers")]
fn given_answering(world: &StitchWorld) {
    world
        .service
        .replace(Some(ServiceChoice::Answering(Arc::new(StubLegProvider::default()))));
}

#[given("a routing service that always fails")]
fn given_failing(world: &StitchWorld) {
    world
        .service
        .replace(Some(ServiceChoice::Failing(Arc::new(FailingProvider::default()))));
}

#[given("a routing service that fails once before answering")]
fn given_flaky(world: &StitchWorld) {
    let provider = StubLegProvider::default().fail_next(LegError::NetworkError {
        url: "http://routing.invalid/route".to_owned(),
        message: "connection reset".to_owned(),
    });
    world
        .service
        .replace(Some(ServiceChoice::Answering(Arc::new(provider))));
}

#[when("the same leg is requested twice")]
fn when_requested_twice(world: &StitchWorld) {
    let legs = world.fetch_twice();
    world.legs.replace(legs);
}

#[when("a route with two stops is stitched")]
fn when_two_stops(world: &StitchWorld) {
    let route = world.stitch(&two_stops());
    world.route.replace(Some(route));
}

#[when("a route with no stops is stitched")]
fn when_no_stops(world: &StitchWorld) {
    let route = world.stitch(&[]);
    world.route.replace(Some(route));
}

#[then("the routing service was called once")]
fn then_called_once(world: &StitchWorld) {
    assert_eq!(world.calls(), 1);
}

#[then("the routing service was called twice")]
fn then_called_twice(world: &StitchWorld) {
    assert_eq!(world.calls(), 2);
}

#[then("no leg is an estimate")]
fn then_no_estimates(world: &StitchWorld) {
    let legs = world.legs.borrow();
    assert_eq!(legs.len(), 2);
    assert!(legs.iter().all(|leg| !leg.is_fallback));
}

#[then("every leg is an estimate")]
fn then_all_estimates(world: &StitchWorld) {
    let route = world.expect_route();
    assert_eq!(route.legs.len(), 3);
    assert!(route.legs.iter().all(|leg| leg.is_fallback));
}

#[then("the route is flagged as using estimates")]
fn then_flagged(world: &StitchWorld) {
    assert!(world.expect_route().has_fallback);
}

#[then("each stop has an arrival estimate")]
fn then_etas(world: &StitchWorld) {
    let route = world.expect_route();
    let ids: Vec<&str> = route
        .stop_etas
        .iter()
        .map(|eta| eta.stop_id.as_str())
        .collect();
    assert_eq!(ids, vec!["north", "east"]);
    assert!(
        route
            .stop_etas
            .windows(2)
            .all(|pair| matches!(pair, [a, b] if a.eta_minutes < b.eta_minutes))
    );
}

#[then("the route has no legs")]
fn then_no_legs(world: &StitchWorld) {
    let route = world.expect_route();
    assert!(route.legs.is_empty());
    assert!(route.polyline.is_empty());
    assert!(route.total_distance.abs() < f64::EPSILON);
}

#[scenario(path = "tests/features/route_stitching.feature", index = 0)]
fn cached_legs(world: StitchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/route_stitching.feature", index = 1)]
fn fallback_route(world: StitchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/route_stitching.feature", index = 2)]
fn empty_route(world: StitchWorld) {
    let _ = world;
}

#[scenario(path = "tests/features/route_stitching.feature", index = 3)]
fn transient_failure(world: StitchWorld) {
    let _ = world;
}
