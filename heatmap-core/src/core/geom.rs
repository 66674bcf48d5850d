//
// Copyright (c) Pirmin Kalberer. All rights reserved.
// Licensed under the MIT License. See LICENSE file in the project root for full license information.
//

use postgis::ewkb;
use tile_grid::Extent;

// Aliases for rust-postgis geometry types
pub type Point = ewkb::Point;
pub type LineString = ewkb::LineString;
pub type Polygon = ewkb::Polygon;
pub type MultiPoint = ewkb::MultiPoint;
pub type MultiLineString = ewkb::MultiLineString;
pub type MultiPolygon = ewkb::MultiPolygon;
pub type GeometryCollection = ewkb::GeometryCollection;
pub type Geometry = ewkb::Geometry;

/// Generic Geometry Data Type
#[derive(Clone, Debug)]
pub enum GeometryType {
    Point(Point),
    LineString(LineString),
    Polygon(Polygon),
    MultiPoint(MultiPoint),
    MultiLineString(MultiLineString),
    MultiPolygon(MultiPolygon),
    GeometryCollection(GeometryCollection),
    /// Geometry column without declared subtype
    Geometry(Geometry),
}

impl GeometryType {
    pub fn is_empty(&self) -> bool {
        match self {
            &GeometryType::LineString(ref p) => p.points.len() == 0,
            &GeometryType::Polygon(ref p) => p.rings.len() == 0,
            &GeometryType::MultiPoint(ref p) => p.points.len() == 0,
            &GeometryType::MultiLineString(ref p) => p.lines.len() == 0,
            &GeometryType::MultiPolygon(ref p) => p.polygons.len() == 0,
            &GeometryType::GeometryCollection(ref p) => p.geometries.len() == 0,
            _ => false,
        }
    }
    /// Runtime type name. Generic geometries report their actual subtype.
    pub fn type_name(&self) -> &'static str {
        match self {
            &GeometryType::Point(_) => "POINT",
            &GeometryType::LineString(_) => "LINESTRING",
            &GeometryType::Polygon(_) => "POLYGON",
            &GeometryType::MultiPoint(_) => "MULTIPOINT",
            &GeometryType::MultiLineString(_) => "MULTILINESTRING",
            &GeometryType::MultiPolygon(_) => "MULTIPOLYGON",
            &GeometryType::GeometryCollection(_) => "GEOMETRYCOLLECTION",
            &GeometryType::Geometry(ref g) => match g {
                &ewkb::GeometryT::Point(_) => "POINT",
                &ewkb::GeometryT::LineString(_) => "LINESTRING",
                &ewkb::GeometryT::Polygon(_) => "POLYGON",
                &ewkb::GeometryT::MultiPoint(_) => "MULTIPOINT",
                &ewkb::GeometryT::MultiLineString(_) => "MULTILINESTRING",
                &ewkb::GeometryT::MultiPolygon(_) => "MULTIPOLYGON",
                &ewkb::GeometryT::GeometryCollection(_) => "GEOMETRYCOLLECTION",
            },
        }
    }
    /// Vertices of point geometries. `None` for lines, polygons and collections.
    pub fn point_coords(&self) -> Option<Vec<(f64, f64)>> {
        match self {
            &GeometryType::Point(ref p) => Some(vec![(p.x, p.y)]),
            &GeometryType::MultiPoint(ref mp) => Some(mp.points.iter().map(|p| (p.x, p.y)).collect()),
            &GeometryType::Geometry(ewkb::GeometryT::Point(ref p)) => Some(vec![(p.x, p.y)]),
            &GeometryType::Geometry(ewkb::GeometryT::MultiPoint(ref mp)) => {
                Some(mp.points.iter().map(|p| (p.x, p.y)).collect())
            }
            _ => None,
        }
    }
    /// Bounding box of all vertices
    pub fn bbox(&self) -> Option<Extent> {
        let mut coords = Vec::new();
        collect_coords(self, &mut coords);
        let mut iter = coords.into_iter();
        let (x, y) = iter.next()?;
        let mut extent = Extent {
            minx: x,
            miny: y,
            maxx: x,
            maxy: y,
        };
        for (x, y) in iter {
            extent.minx = extent.minx.min(x);
            extent.miny = extent.miny.min(y);
            extent.maxx = extent.maxx.max(x);
            extent.maxy = extent.maxy.max(y);
        }
        Some(extent)
    }
}

fn push_line(line: &LineString, coords: &mut Vec<(f64, f64)>) {
    coords.extend(line.points.iter().map(|p| (p.x, p.y)));
}

fn push_polygon(polygon: &Polygon, coords: &mut Vec<(f64, f64)>) {
    for ring in &polygon.rings {
        push_line(ring, coords);
    }
}

fn push_generic(geom: &Geometry, coords: &mut Vec<(f64, f64)>) {
    match geom {
        &ewkb::GeometryT::Point(ref p) => coords.push((p.x, p.y)),
        &ewkb::GeometryT::LineString(ref l) => push_line(l, coords),
        &ewkb::GeometryT::Polygon(ref p) => push_polygon(p, coords),
        &ewkb::GeometryT::MultiPoint(ref mp) => {
            coords.extend(mp.points.iter().map(|p| (p.x, p.y)))
        }
        &ewkb::GeometryT::MultiLineString(ref ml) => {
            for line in &ml.lines {
                push_line(line, coords);
            }
        }
        &ewkb::GeometryT::MultiPolygon(ref mp) => {
            for polygon in &mp.polygons {
                push_polygon(polygon, coords);
            }
        }
        &ewkb::GeometryT::GeometryCollection(ref gc) => {
            for g in &gc.geometries {
                push_generic(g, coords);
            }
        }
    }
}

fn collect_coords(geom: &GeometryType, coords: &mut Vec<(f64, f64)>) {
    match geom {
        &GeometryType::Point(ref p) => coords.push((p.x, p.y)),
        &GeometryType::LineString(ref l) => push_line(l, coords),
        &GeometryType::Polygon(ref p) => push_polygon(p, coords),
        &GeometryType::MultiPoint(ref mp) => coords.extend(mp.points.iter().map(|p| (p.x, p.y))),
        &GeometryType::MultiLineString(ref ml) => {
            for line in &ml.lines {
                push_line(line, coords);
            }
        }
        &GeometryType::MultiPolygon(ref mp) => {
            for polygon in &mp.polygons {
                push_polygon(polygon, coords);
            }
        }
        &GeometryType::GeometryCollection(ref gc) => {
            for g in &gc.geometries {
                push_generic(g, coords);
            }
        }
        &GeometryType::Geometry(ref g) => push_generic(g, coords),
    }
}
