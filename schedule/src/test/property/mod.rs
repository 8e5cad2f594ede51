pub mod shape_props;
