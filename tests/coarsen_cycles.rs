use interval_mesh::prelude::*;

fn leaf_ids(grid: &IntervalGrid) -> Vec<ElemId> {
    grid.leaf_elements().map(|e| e.id()).collect()
}

fn level_ids(grid: &IntervalGrid, level: usize) -> Vec<ElemId> {
    grid.level_elements(level).unwrap().map(|e| e.id()).collect()
}

fn vertex_coords(grid: &IntervalGrid, level: usize) -> Vec<f64> {
    grid.level_vertices(level).unwrap().map(|v| v.coord()).collect()
}

#[test]
fn coarsening_undoes_a_global_refinement() {
    let mut grid = IntervalGrid::uniform(2, 0.0, 1.0).unwrap();
    grid.global_refine(1).unwrap();
    assert_eq!(grid.max_level(), 1);
    assert_eq!(grid.element_count(1).unwrap(), 4);

    for id in level_ids(&grid, 1) {
        grid.mark(id, Mark::Coarsen).unwrap();
    }
    assert!(grid.pre_adapt());
    assert!(grid.adapt().unwrap());
    grid.post_adapt();

    assert_eq!(grid.max_level(), 0);
    assert_eq!(grid.element_count(0).unwrap(), 2);
    assert_eq!(vertex_coords(&grid, 0), vec![0.0, 0.5, 1.0]);
    assert!(grid.level_elements(0).unwrap().all(|e| e.is_leaf()));
    validate_grid(&grid).unwrap();
}

#[test]
fn partial_coarsening_keeps_shared_vertices() {
    let mut grid = IntervalGrid::uniform(2, 0.0, 1.0).unwrap();
    grid.global_refine(1).unwrap();
    assert_eq!(vertex_coords(&grid, 1), vec![0.0, 0.25, 0.5, 0.75, 1.0]);

    // Remove only the sons of the first seed element.
    let first = level_ids(&grid, 0)[0];
    let father = grid.element(first).unwrap();
    let sons = [father.son(0).unwrap().id(), father.son(1).unwrap().id()];
    for id in sons {
        grid.mark(id, Mark::Coarsen).unwrap();
    }
    assert!(grid.pre_adapt());
    assert!(grid.adapt().unwrap());
    grid.post_adapt();

    assert_eq!(grid.max_level(), 1);
    assert_eq!(grid.element_count(1).unwrap(), 2);
    // 0.5 sits on the boundary to the surviving sons and must stay.
    assert_eq!(vertex_coords(&grid, 1), vec![0.5, 0.75, 1.0]);
    assert!(grid.element(first).unwrap().is_leaf());
    assert_eq!(leaf_ids(&grid).len(), 3);
    validate_grid(&grid).unwrap();
}

#[test]
fn coarsening_needs_the_complete_sibling_group() {
    let mut grid = IntervalGrid::uniform(1, 0.0, 1.0).unwrap();
    grid.global_refine(1).unwrap();

    let one_son = level_ids(&grid, 1)[0];
    grid.mark(one_son, Mark::Coarsen).unwrap();
    assert!(grid.pre_adapt());
    // Half a group never coarsens.
    assert!(!grid.adapt().unwrap());
    grid.post_adapt();
    assert_eq!(grid.max_level(), 1);
    assert_eq!(grid.element_count(1).unwrap(), 2);
    validate_grid(&grid).unwrap();
}

#[test]
fn coarsening_removes_one_generation_per_pass() {
    let mut grid = IntervalGrid::uniform(1, 0.0, 1.0).unwrap();
    grid.global_refine(2).unwrap();
    assert_eq!(grid.max_level(), 2);

    // Mark everything above the seed for coarsening.
    for level in 1..=2 {
        for id in level_ids(&grid, level) {
            grid.mark(id, Mark::Coarsen).unwrap();
        }
    }
    assert!(grid.adapt().unwrap());
    assert_eq!(grid.max_level(), 1);
    validate_grid(&grid).unwrap();

    // The surviving marks take effect on the next pass, not this one.
    assert!(grid.adapt().unwrap());
    grid.post_adapt();
    assert_eq!(grid.max_level(), 0);
    assert_eq!(grid.element_count(0).unwrap(), 1);
    validate_grid(&grid).unwrap();
}

#[test]
fn coarsening_bisection_sons_under_copy_closure() {
    let mut grid = IntervalGrid::uniform(2, 0.0, 1.0)
        .unwrap()
        .with_refinement_mode(RefinementMode::CopyClosure);
    let first = level_ids(&grid, 0)[0];
    grid.mark(first, Mark::Refine).unwrap();
    grid.adapt().unwrap();
    grid.post_adapt();
    // Two bisection sons plus the copy of the unrefined neighbor.
    assert_eq!(grid.element_count(1).unwrap(), 3);

    let father = grid.element(first).unwrap();
    let sons = [father.son(0).unwrap().id(), father.son(1).unwrap().id()];
    for id in sons {
        grid.mark(id, Mark::Coarsen).unwrap();
    }
    assert!(grid.adapt().unwrap());
    grid.post_adapt();

    // The closure refills the coarsened slot with a pass-through child,
    // so level 1 tessellates the domain again.
    assert_eq!(grid.max_level(), 1);
    assert_eq!(grid.element_count(1).unwrap(), 2);
    assert!(grid.level_elements(1).unwrap().all(|e| e.father().is_some()));
    assert!(grid
        .level_elements(0)
        .unwrap()
        .all(|e| e.is_copy()));
    let covered: f64 = grid
        .level_elements(1)
        .unwrap()
        .map(|e| e.geometry().volume())
        .sum();
    assert!((covered - 1.0).abs() < 1e-12);
    validate_grid(&grid).unwrap();
}

#[test]
fn stale_handles_are_reported_after_coarsening() {
    let mut grid = IntervalGrid::uniform(1, 0.0, 1.0).unwrap();
    grid.global_refine(1).unwrap();
    let sons = level_ids(&grid, 1);

    for id in &sons {
        grid.mark(*id, Mark::Coarsen).unwrap();
    }
    grid.adapt().unwrap();
    grid.post_adapt();
    assert_eq!(grid.max_level(), 0);

    // Level 1 is gone, so the old son addresses no longer resolve.
    assert!(matches!(
        grid.element(sons[0]),
        Err(MeshError::InvalidLevel {
            level: 1,
            max_level: 0
        })
    ));
    assert!(matches!(
        grid.mark(sons[1], Mark::Refine),
        Err(MeshError::InvalidLevel { .. })
    ));
}
