//! Embedded road network and place table around Awka, Nigeria.
//!
//! A 10-node synthetic network, coarse enough to read, fine enough to route.

use std::io::Cursor;

use anyhow::Result;

use nav_session::Gazetteer;
use nav_spatial::{RoadGraph, load_graph_readers};

const NODES_CSV: &str = "\
id,lat,lon
1,6.2107,7.0722
2,6.2150,7.0722
3,6.2200,7.0722
4,6.2107,7.0780
5,6.2150,7.0780
6,6.2200,7.0780
7,6.2060,7.0722
8,6.2060,7.0660
9,6.2107,7.0660
10,6.2250,7.0850
";

// length_m left empty: haversine between the endpoints.
const EDGES_CSV: &str = "\
from,to,highway,oneway,length_m
1,2,primary,,
2,3,primary,,
1,4,secondary,,
4,5,residential,,
5,6,residential,,
2,5,tertiary,,
3,6,tertiary,,
1,7,primary,,
7,8,residential,,
8,9,residential,,
9,1,residential,,
6,10,trunk,,
";

const PLACES_CSV: &str = "\
name,lat,lon
\"Awka, Nigeria\",6.2107,7.0722
Awka,6.2107,7.0722
Eke Awka Market,6.2148,7.0779
Nnamdi Azikiwe University,6.2248,7.0848
Aroma Junction,6.2061,7.0661
";

pub fn road_graph() -> Result<RoadGraph> {
    Ok(load_graph_readers(Cursor::new(NODES_CSV), Cursor::new(EDGES_CSV))?)
}

pub fn places() -> Result<Gazetteer> {
    Ok(Gazetteer::from_csv_reader(Cursor::new(PLACES_CSV))?)
}
