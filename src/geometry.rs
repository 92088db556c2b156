use std::rc::Rc;

/// Subdivided unit plane centered at the origin, x/y in [-0.5, 0.5].
/// Built once per engine and shared by reference across every item node;
/// per-item texture/scale/bend live in uniforms, not in geometry.
#[derive(Debug)]
pub struct PlaneGeometry {
    positions: Vec<f32>,
    uvs: Vec<f32>,
    indices: Vec<u16>,
    width_segments: u32,
    height_segments: u32,
}

impl PlaneGeometry {
    pub fn new(width_segments: u32, height_segments: u32) -> Self {
        let cols = width_segments + 1;
        let rows = height_segments + 1;

        let mut positions = Vec::with_capacity((cols * rows * 3) as usize);
        let mut uvs = Vec::with_capacity((cols * rows * 2) as usize);
        for iy in 0..rows {
            let v = iy as f32 / height_segments as f32;
            let y = v - 0.5;
            for ix in 0..cols {
                let u = ix as f32 / width_segments as f32;
                let x = u - 0.5;
                positions.extend_from_slice(&[x, y, 0.0]);
                uvs.extend_from_slice(&[u, v]);
            }
        }

        let mut indices = Vec::with_capacity((width_segments * height_segments * 6) as usize);
        for iy in 0..height_segments {
            for ix in 0..width_segments {
                let a = (iy * cols + ix) as u16;
                let b = a + 1;
                let c = a + cols as u16;
                let d = c + 1;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        Self {
            positions,
            uvs,
            indices,
            width_segments,
            height_segments,
        }
    }

    pub fn shared(width_segments: u32, height_segments: u32) -> Rc<Self> {
        Rc::new(Self::new(width_segments, height_segments))
    }

    pub fn positions(&self) -> &[f32] {
        &self.positions
    }

    pub fn uvs(&self) -> &[f32] {
        &self.uvs
    }

    pub fn indices(&self) -> &[u16] {
        &self.indices
    }

    pub fn vertex_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    pub fn segments(&self) -> (u32, u32) {
        (self.width_segments, self.height_segments)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_match_subdivision() {
        let geometry = PlaneGeometry::new(100, 50);
        assert_eq!(geometry.segments(), (100, 50));
        assert_eq!(geometry.vertex_count(), 101 * 51);
        assert_eq!(geometry.uvs().len(), 101 * 51 * 2);
        assert_eq!(geometry.index_count(), 100 * 50 * 6);
        // u16 indices must be able to address every vertex
        assert!(geometry.vertex_count() <= u16::MAX as usize + 1);
    }

    #[test]
    fn plane_spans_unit_square() {
        let geometry = PlaneGeometry::new(2, 2);
        let xs: Vec<f32> = geometry.positions().iter().step_by(3).copied().collect();
        assert_eq!(xs.iter().cloned().fold(f32::MAX, f32::min), -0.5);
        assert_eq!(xs.iter().cloned().fold(f32::MIN, f32::max), 0.5);
    }

    #[test]
    fn shared_geometry_is_one_allocation() {
        let geometry = PlaneGeometry::shared(4, 4);
        let a = Rc::clone(&geometry);
        let b = Rc::clone(&geometry);
        assert!(Rc::ptr_eq(&a, &b));
        assert_eq!(Rc::strong_count(&geometry), 3);
    }
}
