use regex::Regex;

/// List of all routes with params for the app
#[derive(Clone, Debug, PartialEq)]
pub enum Route {
    Healthcheck,
    Categories,
    CategoryAttributes(i32),
    Listings,
    ListingsSearch,
    Listing(i32),
    ListingRefresh(i32),
    ListingAttributes(i32),
    MyListings,
}

type ParamsConverter<R> = Box<dyn Fn(Vec<&str>) -> Option<R> + Send + Sync>;

/// Matches request paths against an ordered list of regexes, first match wins
pub struct RouteParser<R> {
    regex_and_converters: Vec<(Regex, ParamsConverter<R>)>,
}

impl<R> Default for RouteParser<R> {
    fn default() -> Self {
        Self {
            regex_and_converters: vec![],
        }
    }
}

impl<R> RouteParser<R> {
    /// Adds a route without params. Panics on an invalid regex, routes are static.
    pub fn add_route<F>(&mut self, regex_pattern: &str, f: F)
    where
        F: Fn() -> R + Send + Sync + 'static,
    {
        self.add_route_with_params(regex_pattern, move |_| Some(f()));
    }

    /// Adds a route whose capture groups are handed to the converter
    pub fn add_route_with_params<F>(&mut self, regex_pattern: &str, converter: F)
    where
        F: Fn(Vec<&str>) -> Option<R> + Send + Sync + 'static,
    {
        let regex = Regex::new(regex_pattern).unwrap_or_else(|e| panic!("Invalid route regex {}: {}", regex_pattern, e));
        self.regex_and_converters.push((regex, Box::new(converter)));
    }

    /// Tries to match the path against every route in insertion order
    pub fn test(&self, route: &str) -> Option<R> {
        self.regex_and_converters.iter().find_map(|(regex, converter)| {
            regex.captures(route).and_then(|captures| {
                let params = captures.iter().skip(1).filter_map(|m| m.map(|m| m.as_str())).collect::<Vec<_>>();
                converter(params)
            })
        })
    }
}

fn first_id(params: Vec<&str>) -> Option<i32> {
    params.get(0).and_then(|string_id| string_id.parse::<i32>().ok())
}

pub fn create_route_parser() -> RouteParser<Route> {
    let mut router = RouteParser::default();

    // Healthcheck
    router.add_route(r"^/healthcheck$", || Route::Healthcheck);

    // Categories Routes
    router.add_route(r"^/categories$", || Route::Categories);

    // Categories/:id/attributes route
    router.add_route_with_params(r"^/categories/(\d+)/attributes$", |params| first_id(params).map(Route::CategoryAttributes));

    // Listings Routes
    router.add_route(r"^/listings$", || Route::Listings);

    // Listings search route
    router.add_route(r"^/listings/search$", || Route::ListingsSearch);

    // Listings/:id route
    router.add_route_with_params(r"^/listings/(\d+)$", |params| first_id(params).map(Route::Listing));

    // Listings/:id/refresh route
    router.add_route_with_params(r"^/listings/(\d+)/refresh$", |params| first_id(params).map(Route::ListingRefresh));

    // Listings/:id/attributes route
    router.add_route_with_params(r"^/listings/(\d+)/attributes$", |params| first_id(params).map(Route::ListingAttributes));

    // Listings of the caller
    router.add_route(r"^/my/listings$", || Route::MyListings);

    router
}
